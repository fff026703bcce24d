//! Request bodies.
//!
//! Years and scales are kept as raw JSON so that numeric strings are accepted
//! and a bad value is reported with the field name.

use biomecode_core::models::{parse_scale, parse_year, Region, YearRange};
use biomecode_core::Result;
use biomecode_query::QueryTranslator;
use serde::Deserialize;
use serde_json::Value as JsonValue;

/// Change KPI request body
#[derive(Debug, Deserialize)]
pub struct ChangeRequest {
    pub geom: JsonValue,
    pub year_from: JsonValue,
    pub year_to: JsonValue,
    #[serde(default)]
    pub scale: Option<JsonValue>,
}

impl ChangeRequest {
    pub fn region(&self) -> Result<Region> {
        QueryTranslator::resolve_geometry(&self.geom)
    }

    pub fn years(&self) -> Result<YearRange> {
        YearRange::parse(&self.year_from, &self.year_to)
    }

    pub fn scale(&self, default: u32) -> Result<u32> {
        parse_scale(self.scale.as_ref(), default)
    }
}

/// Change tile request body
#[derive(Debug, Deserialize)]
pub struct TileRequest {
    pub geom: JsonValue,
    pub year_from: JsonValue,
    pub year_to: JsonValue,
}

impl TileRequest {
    pub fn region(&self) -> Result<Region> {
        QueryTranslator::resolve_geometry(&self.geom)
    }

    pub fn years(&self) -> Result<YearRange> {
        YearRange::parse(&self.year_from, &self.year_to)
    }
}

/// Land-cover KPI request body
#[derive(Debug, Deserialize)]
pub struct LandcoverRequest {
    pub geom: JsonValue,
    pub year: JsonValue,
    #[serde(default)]
    pub scale: Option<JsonValue>,
    /// Training table asset id; anything but a non-empty string counts as absent
    #[serde(default)]
    pub training_asset: Option<JsonValue>,
}

impl LandcoverRequest {
    pub fn region(&self) -> Result<Region> {
        QueryTranslator::resolve_geometry(&self.geom)
    }

    pub fn year(&self) -> Result<i32> {
        parse_year(&self.year, "year")
    }

    pub fn scale(&self, default: u32) -> Result<u32> {
        parse_scale(self.scale.as_ref(), default)
    }

    pub fn training_asset(&self) -> Option<&str> {
        self.training_asset.as_ref().and_then(JsonValue::as_str)
    }
}

/// Climate KPI request body
#[derive(Debug, Deserialize)]
pub struct ClimateRequest {
    pub geom: JsonValue,
    pub year: JsonValue,
    #[serde(default)]
    pub variables: Option<Vec<String>>,
}

impl ClimateRequest {
    pub fn region(&self) -> Result<Region> {
        QueryTranslator::resolve_geometry(&self.geom)
    }

    pub fn year(&self) -> Result<i32> {
        parse_year(&self.year, "year")
    }
}

/// Soil KPI request body
#[derive(Debug, Deserialize)]
pub struct SoilRequest {
    pub geom: JsonValue,
    /// Accepted in any shape and ignored; the soil bands are fixed
    #[serde(default)]
    pub variables: Option<JsonValue>,
}

impl SoilRequest {
    pub fn region(&self) -> Result<Region> {
        QueryTranslator::resolve_geometry(&self.geom)
    }

    /// String entries of `variables`, for logging
    pub fn variable_names(&self) -> Option<Vec<String>> {
        let list = self.variables.as_ref()?.as_array()?;
        Some(list.iter().filter_map(JsonValue::as_str).map(str::to_string).collect())
    }
}
