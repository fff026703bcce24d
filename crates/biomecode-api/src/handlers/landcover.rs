use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};
use biomecode_core::models::LandcoverOutcome;
use biomecode_query::DEFAULT_LANDCOVER_SCALE;

use crate::dto::{LandcoverRequest, LandcoverResponse, NotImplementedResponse};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn landcover_kpi(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LandcoverRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;

    let region = request.region()?;
    let year = request.year()?;
    let scale = request.scale(DEFAULT_LANDCOVER_SCALE)?;

    tracing::info!(
        year,
        scale,
        has_training_asset = request.training_asset().is_some(),
        "Computing land-cover KPI"
    );

    let outcome = state
        .translator
        .compute_landcover_kpi(&region, year, scale, request.training_asset())
        .await?;

    let response = match outcome {
        LandcoverOutcome::Areas { year, areas } => {
            Json(LandcoverResponse { year, areas }).into_response()
        }
        LandcoverOutcome::NeedsTrainingData { message } => {
            // Soft failure: the 501 marker travels in a 200 body
            Json(NotImplementedResponse::new(message)).into_response()
        }
    };

    Ok(response)
}
