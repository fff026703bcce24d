//! BiomeCode Query - KPI and tile use cases
//!
//! This crate turns validated request parameters into expressions for the
//! remote platform and decodes the values it returns.

pub mod composite;
pub mod translator;

pub use composite::{
    change_severity_image, load_annual_composite, CHANGE_SEVERITY_BAND, SIMILARITY_BAND,
};
pub use translator::{
    QueryTranslator, CLIMATE_SCALE, DEFAULT_CHANGE_SCALE, DEFAULT_LANDCOVER_SCALE, SOIL_SCALE,
};
