//! KPI results produced once per request.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::params::parse_integer;

/// Name reported for the change KPI
pub const CHANGE_KPI_NAME: &str = "change_severity_mean";

/// Message returned when a land-cover request carries no training data
pub const MISSING_TRAINING_MESSAGE: &str = "Provide 'training_asset' (an Earth Engine \
    FeatureCollection asset id) with columns: landcover, A00..A63. Sample an annual \
    embedding composite over labelled points to create one.";

/// Mean change severity between two annual composites
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeKpi {
    pub kpi: &'static str,
    pub year_from: i32,
    pub year_to: i32,
    pub value: f64,
}

impl ChangeKpi {
    pub fn new(year_from: i32, year_to: i32, value: f64) -> Self {
        Self { kpi: CHANGE_KPI_NAME, year_from, year_to, value }
    }
}

/// Classified area for one land-cover class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassArea {
    /// Class label as carried by the training data
    #[serde(deserialize_with = "deserialize_class")]
    pub class: i64,
    /// Area in hectares
    pub sum: f64,
}

fn deserialize_class<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    parse_integer(&value, "class").map_err(serde::de::Error::custom)
}

/// Result of a land-cover request
#[derive(Debug, Clone, PartialEq)]
pub enum LandcoverOutcome {
    /// Per-class areas for the classified composite
    Areas { year: i32, areas: Vec<ClassArea> },
    /// No training table was supplied; nothing was sent to the remote platform
    NeedsTrainingData { message: String },
}

impl LandcoverOutcome {
    pub fn needs_training_data() -> Self {
        Self::NeedsTrainingData { message: MISSING_TRAINING_MESSAGE.to_string() }
    }

    /// Total classified area in hectares
    pub fn total_area(&self) -> f64 {
        match self {
            Self::Areas { areas, .. } => areas.iter().map(|a| a.sum).sum(),
            Self::NeedsTrainingData { .. } => 0.0,
        }
    }
}

/// Annual climate aggregates for the requested variables
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClimateKpi {
    pub year: i32,
    pub units: BTreeMap<String, String>,
    /// `None` where the region has no coverage for a variable
    pub values: BTreeMap<String, Option<f64>>,
}

/// Topsoil fractions in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoilFractions {
    pub clay: Option<f64>,
    pub silt: Option<f64>,
    pub sand: Option<f64>,
}

/// Topsoil texture for a region
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoilKpi {
    pub depth: &'static str,
    pub units: &'static str,
    pub values: SoilFractions,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_change_kpi_serialization() {
        let kpi = ChangeKpi::new(2019, 2023, 0.125);
        assert_eq!(
            serde_json::to_value(&kpi).unwrap(),
            json!({
                "kpi": "change_severity_mean",
                "year_from": 2019,
                "year_to": 2023,
                "value": 0.125
            })
        );
    }

    #[test]
    fn test_class_area_accepts_float_labels() {
        let area: ClassArea = serde_json::from_value(json!({ "class": 2.0, "sum": 12.5 })).unwrap();
        assert_eq!(area, ClassArea { class: 2, sum: 12.5 });

        let area: ClassArea = serde_json::from_value(json!({ "class": 5, "sum": 0.0 })).unwrap();
        assert_eq!(area.class, 5);
    }

    #[test]
    fn test_total_area() {
        let outcome = LandcoverOutcome::Areas {
            year: 2022,
            areas: vec![ClassArea { class: 1, sum: 10.0 }, ClassArea { class: 5, sum: 2.5 }],
        };
        assert_eq!(outcome.total_area(), 12.5);
        assert_eq!(LandcoverOutcome::needs_training_data().total_area(), 0.0);
    }
}
