use std::collections::BTreeMap;
use std::sync::Arc;

use biomecode_core::error::{BiomeError, Result};
use biomecode_core::models::climate::ClimateVariable;
use biomecode_core::models::datasets::SOIL_DEPTH;
use biomecode_core::models::{
    ChangeKpi, ClassArea, ClimateKpi, LandcoverOutcome, Region, SoilFractions, SoilKpi, YearRange,
};
use biomecode_engine::{EarthEngine, Expression, Reducer, ValueNode};
use serde_json::Value as JsonValue;

use crate::composite::{
    change_severity_image, change_visualization, climate_annual_image, landcover_area_image,
    soil_fraction_image, CHANGE_SEVERITY_BAND, CLASS_BAND,
};

/// Default ground sample distance of the change KPI, in metres
pub const DEFAULT_CHANGE_SCALE: u32 = 20;

/// Default ground sample distance of the land-cover KPI, in metres
pub const DEFAULT_LANDCOVER_SCALE: u32 = 20;

/// Reanalysis grid is coarse; finer scales only cost time
pub const CLIMATE_SCALE: u32 = 1000;

pub const SOIL_SCALE: u32 = 250;

const SOIL_UNITS: &str = "%";

/// Translates KPI requests into expressions and evaluates them on an engine
pub struct QueryTranslator {
    engine: Arc<dyn EarthEngine>,
}

impl QueryTranslator {
    /// Create a new translator over a shared engine handle
    pub fn new(engine: Arc<dyn EarthEngine>) -> Self {
        Self { engine }
    }

    /// Name of the engine adapter, for logs and health output
    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Resolve the region of interest from a request's `geom` member
    pub fn resolve_geometry(body: &JsonValue) -> Result<Region> {
        Region::resolve(body)
    }

    /// Evaluate a trivial expression to prove the engine is reachable
    pub async fn health(&self) -> Result<f64> {
        let value = self.engine.compute_value(&Expression::new(ValueNode::constant(1))).await?;
        value.as_f64().ok_or_else(|| unexpected("health check", &value))
    }

    /// Mean change severity between the composites of two years
    pub async fn compute_change_kpi(
        &self,
        region: &Region,
        years: YearRange,
        scale: u32,
    ) -> Result<ChangeKpi> {
        if years.is_reversed() {
            tracing::debug!(year_from = years.from, year_to = years.to, "Reversed year range");
        }

        let mean = change_severity_image(region, years)
            .reduce_region(Reducer::mean(), region, f64::from(scale))
            .get(CHANGE_SEVERITY_BAND);

        let value = self.engine.compute_value(&Expression::new(mean)).await?;
        let value = match value {
            JsonValue::Null => {
                return Err(BiomeError::no_data(format!(
                    "no pixels to compare between {} and {} in the region",
                    years.from, years.to
                )))
            }
            other => other.as_f64().ok_or_else(|| unexpected("change severity", &other))?,
        };

        tracing::debug!(year_from = years.from, year_to = years.to, value, "Change KPI computed");
        Ok(ChangeKpi::new(years.from, years.to, value))
    }

    /// `{z}/{x}/{y}` URL template for the change severity layer
    pub async fn compute_change_tiles(&self, region: &Region, years: YearRange) -> Result<String> {
        let image = change_visualization(region, years);
        let handle = self.engine.create_map(&Expression::new(image)).await?;

        tracing::debug!(mapid = %handle.mapid, "Change map registered");
        Ok(self.engine.tile_url(&handle))
    }

    /// Classified area per land-cover class.
    ///
    /// Without a training table nothing is sent to the engine and the outcome
    /// tells the caller how to supply one.
    pub async fn compute_landcover_kpi(
        &self,
        region: &Region,
        year: i32,
        scale: u32,
        training_asset: Option<&str>,
    ) -> Result<LandcoverOutcome> {
        let Some(asset) = training_asset.map(str::trim).filter(|a| !a.is_empty()) else {
            tracing::info!(year, "Land-cover request without training data");
            return Ok(LandcoverOutcome::needs_training_data());
        };

        let grouped = landcover_area_image(region, year, asset).reduce_region(
            Reducer::sum().group(1, CLASS_BAND),
            region,
            f64::from(scale),
        );

        let value = self.engine.compute_value(&Expression::new(grouped)).await?;
        let areas = decode_groups(value)?;

        let outcome = LandcoverOutcome::Areas { year, areas };
        tracing::debug!(year, hectares = outcome.total_area(), "Land-cover KPI computed");
        Ok(outcome)
    }

    /// Annual climate aggregates for the requested variables, or the defaults
    pub async fn compute_climate_kpi(
        &self,
        region: &Region,
        year: i32,
        variables: Option<&[String]>,
    ) -> Result<ClimateKpi> {
        let variables = ClimateVariable::resolve(variables)?;

        let stats = climate_annual_image(year, &variables).reduce_region(
            Reducer::mean(),
            region,
            f64::from(CLIMATE_SCALE),
        );

        let value = self.engine.compute_value(&Expression::new(stats)).await?;
        let stats = decode_dictionary("climate statistics", value)?;

        let units = variables.iter().map(|v| (v.name.to_string(), v.unit.to_string())).collect();
        let values = variables
            .iter()
            .map(|v| (v.name.to_string(), stats.get(v.name).and_then(JsonValue::as_f64)))
            .collect();

        Ok(ClimateKpi { year, units, values })
    }

    /// Topsoil texture; `variables` is accepted for compatibility and ignored
    pub async fn compute_soil_kpi(
        &self,
        region: &Region,
        variables: Option<&[String]>,
    ) -> Result<SoilKpi> {
        if let Some(variables) = variables {
            tracing::debug!(?variables, "Soil variables are fixed; request list ignored");
        }

        let stats =
            soil_fraction_image().reduce_region(Reducer::mean(), region, f64::from(SOIL_SCALE));

        let value = self.engine.compute_value(&Expression::new(stats)).await?;
        let stats = decode_dictionary("soil statistics", value)?;
        let fraction = |name: &str| stats.get(name).and_then(JsonValue::as_f64);

        Ok(SoilKpi {
            depth: SOIL_DEPTH,
            units: SOIL_UNITS,
            values: SoilFractions {
                clay: fraction("clay"),
                silt: fraction("silt"),
                sand: fraction("sand"),
            },
        })
    }
}

fn unexpected(what: &str, value: &JsonValue) -> BiomeError {
    BiomeError::RemoteEvaluation {
        status: "INVALID_RESPONSE".to_string(),
        message: format!("Unexpected {} value: {}", what, value),
    }
}

/// A reduction result; null means the region had no pixels at all
fn decode_dictionary(what: &str, value: JsonValue) -> Result<BTreeMap<String, JsonValue>> {
    match value {
        JsonValue::Object(map) => Ok(map.into_iter().collect()),
        JsonValue::Null => Ok(BTreeMap::new()),
        other => Err(unexpected(what, &other)),
    }
}

fn decode_groups(value: JsonValue) -> Result<Vec<ClassArea>> {
    let mut stats = decode_dictionary("land-cover groups", value)?;

    match stats.remove("groups") {
        None | Some(JsonValue::Null) => Ok(Vec::new()),
        Some(groups) => serde_json::from_value(groups.clone())
            .map_err(|e| unexpected(&format!("land-cover groups ({})", e), &groups)),
    }
}
