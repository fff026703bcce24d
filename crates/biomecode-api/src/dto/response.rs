use biomecode_core::models::ClassArea;
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    /// Value the engine returned for the constant probe
    pub ee: f64,
}

impl HealthResponse {
    pub fn new(ee: f64) -> Self {
        Self { ok: true, ee }
    }
}

/// Change tile response
#[derive(Debug, Serialize)]
pub struct TileResponse {
    #[serde(rename = "tileUrl")]
    pub tile_url: String,
}

/// Land-cover areas response
#[derive(Debug, Serialize)]
pub struct LandcoverResponse {
    pub year: i32,
    pub areas: Vec<ClassArea>,
}

/// Soft-failure body: HTTP 200 carrying a 501 status marker
#[derive(Debug, Serialize)]
pub struct NotImplementedResponse {
    pub status: u16,
    pub message: String,
}

impl NotImplementedResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { status: 501, message: message.into() }
    }
}
