//! Deterministic sample assets for running the service without credentials.
//!
//! Embedding vectors have every component at +/-0.125, so each is exactly
//! unit length and dot products are exact. Each year after 2017 flips four
//! more components than the year before, which makes the change severity
//! between two years `|to - from| / 8`.

use std::ops::RangeInclusive;

use biomecode_core::models::climate::KELVIN_OFFSET;
use biomecode_core::models::datasets::{CLIMATE_COLLECTION, EMBEDDING_COLLECTION, SOIL_IMAGE};
use biomecode_core::models::EMBEDDING_BANDS;

use super::{MemoryEngine, MemoryFeature, MemoryImage};

/// Years covered by the sample collections
pub const FIXTURE_YEARS: RangeInclusive<i32> = 2017..=2024;

/// Training table id understood by the sample engine
pub const SAMPLE_TRAINING_TABLE: &str = "projects/biomecode/assets/landcover_samples";

const COMPONENT: f64 = 0.125;
const FLIPS_PER_YEAR: usize = 4;

fn components(flipped: usize) -> Vec<(&'static str, f64)> {
    EMBEDDING_BANDS
        .iter()
        .enumerate()
        .map(|(i, band)| (band, if i < flipped { -COMPONENT } else { COMPONENT }))
        .collect()
}

/// Annual embedding composite for `year`
pub fn embedding(year: i32) -> MemoryImage {
    let flipped = (year - FIXTURE_YEARS.start()).max(0) as usize * FLIPS_PER_YEAR;
    MemoryImage::new().with_bands(components(flipped)).dated(year, 1)
}

/// Monthly reanalysis means for one month
pub fn climate_month(year: i32, month: u32) -> MemoryImage {
    let m = f64::from(month);
    MemoryImage::new()
        .with_band("t2m", KELVIN_OFFSET + 5.0 + m)
        .with_band("d2m", KELVIN_OFFSET + m)
        .with_band("tp", 0.001 * m)
        .with_band("u10", 1.5)
        .with_band("v10", -0.5)
        .with_band("sp", 101_325.0)
        .dated(year, month)
}

/// Topsoil texture in per-mille, as stored upstream
pub fn soil() -> MemoryImage {
    MemoryImage::new()
        .with_band("clay_0-5cm_mean", 200.0)
        .with_band("silt_0-5cm_mean", 300.0)
        .with_band("sand_0-5cm_mean", 500.0)
        .with_band("clay_5-15cm_mean", 220.0)
        .with_band("silt_5-15cm_mean", 290.0)
        .with_band("sand_5-15cm_mean", 490.0)
}

/// One labelled sample per class, placed on the embedding of a sample year
pub fn training_samples() -> Vec<MemoryFeature> {
    let prototypes = [(1.0, 0), (2.0, 8), (3.0, 16), (4.0, 24), (5.0, 64)];

    prototypes
        .iter()
        .map(|&(class, flipped)| {
            components(flipped).into_iter().fold(
                MemoryFeature::new().with_property("landcover", class),
                |feature, (band, value)| feature.with_property(band, value),
            )
        })
        .collect()
}

impl MemoryEngine {
    /// Engine preloaded with every sample asset
    pub fn with_fixtures() -> Self {
        let climate = FIXTURE_YEARS
            .flat_map(|year| (1..=12).map(move |month| climate_month(year, month)))
            .collect();

        Self::new()
            .with_collection(EMBEDDING_COLLECTION, FIXTURE_YEARS.map(embedding).collect())
            .with_collection(CLIMATE_COLLECTION, climate)
            .with_image(SOIL_IMAGE, soil())
            .with_table(SAMPLE_TRAINING_TABLE, training_samples())
    }
}
