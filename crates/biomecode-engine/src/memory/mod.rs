//! In-memory engine for development and testing.
//!
//! Rasters are uniform: every image carries one value per band, so zonal
//! statistics reduce to arithmetic on those values and the region's area.
//! Only the functions this service emits are understood.
//!
//! History and counters use `Mutex::lock().unwrap()` intentionally. Lock
//! poisoning only occurs when another thread panicked while holding the lock,
//! which is an unrecoverable state. For real data, use the REST engine.

mod eval;
pub mod fixtures;

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use biomecode_core::error::{BiomeError, Result};
use biomecode_core::models::TileHandle;
use serde_json::Value as JsonValue;

use crate::expr::Expression;
use crate::ports::EarthEngine;

use eval::{Evaluator, Val};

/// Base URL reported for in-memory map layers
pub const MEMORY_TILE_BASE: &str = "memory://earthengine";

/// A uniform image: one value per band, optionally dated
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MemoryImage {
    bands: Vec<(String, f64)>,
    year: Option<i32>,
    month: Option<u32>,
}

impl MemoryImage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_band(mut self, name: impl Into<String>, value: f64) -> Self {
        self.bands.push((name.into(), value));
        self
    }

    pub fn with_bands<I, S>(mut self, bands: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        self.bands.extend(bands.into_iter().map(|(n, v)| (n.into(), v)));
        self
    }

    /// Acquisition date used by calendar filters
    pub fn dated(mut self, year: i32, month: u32) -> Self {
        self.year = Some(year);
        self.month = Some(month);
        self
    }

    pub fn band(&self, name: &str) -> Option<f64> {
        self.bands.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    pub fn band_names(&self) -> Vec<&str> {
        self.bands.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub(crate) fn bands(&self) -> &[(String, f64)] {
        &self.bands
    }

    pub(crate) fn from_bands(bands: Vec<(String, f64)>) -> Self {
        Self { bands, year: None, month: None }
    }

    pub(crate) fn calendar_field(&self, field: &str) -> Option<i64> {
        match field {
            "year" => self.year.map(i64::from),
            "month" => self.month.map(i64::from),
            _ => None,
        }
    }
}

/// A row of a table asset, e.g. a labelled training sample
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MemoryFeature {
    properties: BTreeMap<String, f64>,
}

impl MemoryFeature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_property(mut self, name: impl Into<String>, value: f64) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    pub fn property(&self, name: &str) -> Option<f64> {
        self.properties.get(name).copied()
    }
}

/// Assets visible to the evaluator
#[derive(Debug, Clone, Default)]
pub(crate) struct Catalog {
    pub collections: HashMap<String, Vec<MemoryImage>>,
    pub images: HashMap<String, MemoryImage>,
    pub tables: HashMap<String, Vec<MemoryFeature>>,
}

/// In-memory implementation of EarthEngine
#[derive(Debug, Default)]
pub struct MemoryEngine {
    catalog: Catalog,
    history: Mutex<Vec<Expression>>,
    maps: Mutex<u64>,
}

impl MemoryEngine {
    /// Create an engine with no assets
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(mut self, id: impl Into<String>, images: Vec<MemoryImage>) -> Self {
        self.catalog.collections.insert(id.into(), images);
        self
    }

    pub fn with_image(mut self, id: impl Into<String>, image: MemoryImage) -> Self {
        self.catalog.images.insert(id.into(), image);
        self
    }

    pub fn with_table(mut self, id: impl Into<String>, features: Vec<MemoryFeature>) -> Self {
        self.catalog.tables.insert(id.into(), features);
        self
    }

    /// Number of expressions received, successful or not
    pub fn evaluations(&self) -> usize {
        self.history.lock().unwrap().len()
    }

    /// Every expression received, oldest first
    pub fn history(&self) -> Vec<Expression> {
        self.history.lock().unwrap().clone()
    }

    fn evaluate(&self, expression: &Expression) -> Result<Val> {
        self.history.lock().unwrap().push(expression.clone());

        let root = expression.root().ok_or_else(|| BiomeError::RemoteEvaluation {
            status: "INVALID_ARGUMENT".to_string(),
            message: format!("Expression has no value named '{}'.", expression.result),
        })?;

        Evaluator::new(&self.catalog).eval_root(root)
    }
}

#[async_trait]
impl EarthEngine for MemoryEngine {
    async fn compute_value(&self, expression: &Expression) -> Result<JsonValue> {
        Ok(self.evaluate(expression)?.into_json())
    }

    async fn create_map(&self, expression: &Expression) -> Result<TileHandle> {
        match self.evaluate(expression)? {
            Val::Image(_) => {
                let mut maps = self.maps.lock().unwrap();
                *maps += 1;
                Ok(TileHandle::new(format!("projects/memory/maps/{}", *maps), ""))
            }
            other => Err(BiomeError::RemoteEvaluation {
                status: "INVALID_ARGUMENT".to_string(),
                message: format!("Cannot create a map from {}.", other.type_name()),
            }),
        }
    }

    fn tile_url(&self, handle: &TileHandle) -> String {
        handle.url_template(MEMORY_TILE_BASE)
    }

    fn name(&self) -> &str {
        "memory"
    }
}
