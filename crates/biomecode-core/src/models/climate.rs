//! Declared climate variables and their unit handling.
//!
//! Units in a climate response are looked up here for exactly the variables a
//! caller asked for; a variable missing from the table is rejected.

use crate::error::{BiomeError, Result};

/// Offset between Kelvin and degrees Celsius
pub const KELVIN_OFFSET: f64 = 273.15;

/// Variables reported when a request does not name any
pub const DEFAULT_CLIMATE_VARIABLES: [&str; 4] = ["t2m", "tp", "u10", "v10"];

/// How monthly values are folded into one annual value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Aggregation {
    /// Arithmetic mean of the monthly values
    Mean,
    /// Sum of the monthly values multiplied by `factor`
    Sum { factor: f64 },
}

/// A climate band with its reporting unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateVariable {
    pub name: &'static str,
    pub unit: &'static str,
    /// Added to every monthly value before aggregation
    pub offset: f64,
    pub aggregation: Aggregation,
}

static CLIMATE_VARIABLES: [ClimateVariable; 6] = [
    ClimateVariable {
        name: "t2m",
        unit: "°C",
        offset: -KELVIN_OFFSET,
        aggregation: Aggregation::Mean,
    },
    ClimateVariable {
        name: "d2m",
        unit: "°C",
        offset: -KELVIN_OFFSET,
        aggregation: Aggregation::Mean,
    },
    // metres of water per month, reported as millimetres per year
    ClimateVariable {
        name: "tp",
        unit: "mm",
        offset: 0.0,
        aggregation: Aggregation::Sum { factor: 1000.0 },
    },
    ClimateVariable { name: "u10", unit: "m/s", offset: 0.0, aggregation: Aggregation::Mean },
    ClimateVariable { name: "v10", unit: "m/s", offset: 0.0, aggregation: Aggregation::Mean },
    ClimateVariable { name: "sp", unit: "Pa", offset: 0.0, aggregation: Aggregation::Mean },
];

impl ClimateVariable {
    /// Look up a declared variable by band name
    pub fn lookup(name: &str) -> Option<&'static ClimateVariable> {
        CLIMATE_VARIABLES.iter().find(|v| v.name == name)
    }

    /// All declared variables
    pub fn all() -> &'static [ClimateVariable] {
        &CLIMATE_VARIABLES
    }

    /// Resolve the requested variable names, or the defaults when none are given.
    ///
    /// Duplicates are dropped, first occurrence wins.
    pub fn resolve(requested: Option<&[String]>) -> Result<Vec<&'static ClimateVariable>> {
        let names: Vec<&str> = match requested {
            Some(names) => names.iter().map(String::as_str).collect(),
            None => DEFAULT_CLIMATE_VARIABLES.to_vec(),
        };

        if names.is_empty() {
            return Err(BiomeError::malformed("'variables' must name at least one variable"));
        }

        let mut resolved: Vec<&'static ClimateVariable> = Vec::with_capacity(names.len());
        for name in names {
            let variable = Self::lookup(name).ok_or_else(|| {
                let known: Vec<&str> = Self::all().iter().map(|v| v.name).collect();
                BiomeError::malformed(format!(
                    "unknown climate variable '{}', expected one of: {}",
                    name,
                    known.join(", ")
                ))
            })?;
            if !resolved.iter().any(|v| v.name == variable.name) {
                resolved.push(variable);
            }
        }

        Ok(resolved)
    }
}
