use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use biomecode_core::models::SoilKpi;

use crate::dto::SoilRequest;
use crate::error::ApiError;
use crate::state::AppState;

pub async fn soil_kpi(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SoilRequest>, JsonRejection>,
) -> Result<Json<SoilKpi>, ApiError> {
    let Json(request) = payload?;

    let region = request.region()?;

    tracing::info!(geometry = region.geometry().type_name(), "Computing soil KPI");

    let variables = request.variable_names();
    let kpi = state.translator.compute_soil_kpi(&region, variables.as_deref()).await?;

    Ok(Json(kpi))
}
