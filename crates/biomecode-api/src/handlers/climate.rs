use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use biomecode_core::models::ClimateKpi;

use crate::dto::ClimateRequest;
use crate::error::ApiError;
use crate::state::AppState;

pub async fn climate_kpi(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ClimateRequest>, JsonRejection>,
) -> Result<Json<ClimateKpi>, ApiError> {
    let Json(request) = payload?;

    let region = request.region()?;
    let year = request.year()?;

    tracing::info!(year, variables = ?request.variables, "Computing climate KPI");

    let kpi = state
        .translator
        .compute_climate_kpi(&region, year, request.variables.as_deref())
        .await?;

    Ok(Json(kpi))
}
