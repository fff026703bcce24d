use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use biomecode_core::models::ChangeKpi;
use biomecode_query::DEFAULT_CHANGE_SCALE;

use crate::dto::{ChangeRequest, TileRequest, TileResponse};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn change_kpi(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChangeRequest>, JsonRejection>,
) -> Result<Json<ChangeKpi>, ApiError> {
    let Json(request) = payload?;

    let region = request.region()?;
    let years = request.years()?;
    let scale = request.scale(DEFAULT_CHANGE_SCALE)?;

    tracing::info!(
        year_from = years.from,
        year_to = years.to,
        scale,
        geometry = region.geometry().type_name(),
        "Computing change KPI"
    );

    let kpi = state.translator.compute_change_kpi(&region, years, scale).await?;

    Ok(Json(kpi))
}

pub async fn change_tiles(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TileRequest>, JsonRejection>,
) -> Result<Json<TileResponse>, ApiError> {
    let Json(request) = payload?;

    let region = request.region()?;
    let years = request.years()?;

    tracing::info!(year_from = years.from, year_to = years.to, "Registering change tiles");

    let tile_url = state.translator.compute_change_tiles(&region, years).await?;

    Ok(Json(TileResponse { tile_url }))
}
