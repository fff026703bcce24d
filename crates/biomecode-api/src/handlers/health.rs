use std::sync::Arc;

use axum::{extract::State, Json};

use crate::dto::HealthResponse;
use crate::error::ApiError;
use crate::state::AppState;

pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HealthResponse>, ApiError> {
    let ee = state.translator.health().await?;

    tracing::debug!(engine = state.translator.engine_name(), ee, "Health probe evaluated");

    Ok(Json(HealthResponse::new(ee)))
}
