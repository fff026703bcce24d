use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the API router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // KPIs
        .route("/kpi/change", post(handlers::change_kpi))
        .route("/kpi/landcover", post(handlers::landcover_kpi))
        .route("/kpi/climate", post(handlers::climate_kpi))
        .route("/kpi/soil", post(handlers::soil_kpi))
        // Map layers
        .route("/tiles/change", post(handlers::change_tiles))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
