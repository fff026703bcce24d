//! Expression builders shared by the KPI and tile operations.
//!
//! Nothing here talks to the remote platform; every function returns an
//! expression to be evaluated later.

use biomecode_core::models::climate::{Aggregation, ClimateVariable};
use biomecode_core::models::datasets::{
    CLIMATE_COLLECTION, EMBEDDING_COLLECTION, SOIL_FRACTIONS, SOIL_IMAGE,
};
use biomecode_core::models::{Region, YearRange, EMBEDDING_BANDS};
use biomecode_engine::{Classifier, FeatureCollection, Filter, Image, ImageCollection, Reducer};

/// Band holding the per-pixel dot product of two composites
pub const SIMILARITY_BAND: &str = "cosine_similarity";

/// Band holding `1 - similarity`
pub const CHANGE_SEVERITY_BAND: &str = "change_severity";

/// Band holding the classified land-cover label
pub const CLASS_BAND: &str = "class";

/// Property of the training table carrying the class label
pub const TRAINING_CLASS_PROPERTY: &str = "landcover";

pub const RANDOM_FOREST_TREES: u32 = 100;

const SQUARE_METRES_PER_HECTARE: f64 = 1e4;

/// Soil rasters store fractions in per-mille
const PER_MILLE_TO_PERCENT: f64 = 10.0;

/// Annual embedding composite for `year`, clipped to the region.
///
/// An empty year is not detected here: the remote side fails when it clips
/// the null first image.
pub fn load_annual_composite(year: i32, region: &Region) -> Image {
    ImageCollection::load(EMBEDDING_COLLECTION)
        .filter(Filter::year(year))
        .first()
        .clip(region)
        .select(EMBEDDING_BANDS.names())
}

/// Per-pixel change severity between the composites of two years.
///
/// Embeddings are unit length, so the band-wise dot product is the cosine
/// similarity and identical composites score exactly 0.
pub fn change_severity_image(region: &Region, years: YearRange) -> Image {
    let from = load_annual_composite(years.from, region);
    let to = load_annual_composite(years.to, region);

    let similarity = from.multiply(to).reduce(Reducer::sum()).rename(&[SIMILARITY_BAND]);

    Image::constant(1.0).subtract(similarity).rename(&[CHANGE_SEVERITY_BAND])
}

/// Single-band rendering of the severity image for map tiles
pub fn change_visualization(region: &Region, years: YearRange) -> Image {
    change_severity_image(region, years).visualize(0.0, 1.0).update_mask(Image::constant(1.0))
}

/// Hectare raster stacked with the classified composite.
///
/// Band 0 is the pixel area in hectares, band 1 the class label, which is the
/// layout a grouped sum expects.
pub fn landcover_area_image(region: &Region, year: i32, training_asset: &str) -> Image {
    let classifier = Classifier::smile_random_forest(RANDOM_FOREST_TREES).train(
        FeatureCollection::load(training_asset),
        TRAINING_CLASS_PROPERTY,
        EMBEDDING_BANDS.names(),
    );

    let classes =
        load_annual_composite(year, region).classify(classifier, CLASS_BAND).clip(region);

    Image::pixel_area()
        .divide(Image::constant(SQUARE_METRES_PER_HECTARE))
        .add_bands(classes, false)
}

/// Annual aggregate of the monthly climate records for `year`.
///
/// Every variable starts as the mean of the monthly values. Variables with an
/// offset are shifted and accumulated variables are replaced by their scaled
/// annual sum; both overwrite the mean band of the same name.
pub fn climate_annual_image(year: i32, variables: &[&ClimateVariable]) -> Image {
    let monthly = ImageCollection::load(CLIMATE_COLLECTION).filter(Filter::year(year));
    let names: Vec<&str> = variables.iter().map(|v| v.name).collect();

    let mut annual = monthly.clone().mean().select(&names);

    for variable in variables {
        let adjusted = match variable.aggregation {
            Aggregation::Sum { factor } => monthly
                .clone()
                .sum()
                .select(&[variable.name])
                .multiply(Image::constant(factor))
                .rename(&[variable.name]),
            Aggregation::Mean if variable.offset != 0.0 => monthly
                .clone()
                .mean()
                .select(&[variable.name])
                .add(Image::constant(variable.offset))
                .rename(&[variable.name]),
            Aggregation::Mean => continue,
        };
        annual = annual.add_bands(adjusted, true);
    }

    annual
}

/// Topsoil clay, silt and sand in percent
pub fn soil_fraction_image() -> Image {
    let bands: Vec<&str> = SOIL_FRACTIONS.iter().map(|(band, _)| *band).collect();
    let names: Vec<&str> = SOIL_FRACTIONS.iter().map(|(_, name)| *name).collect();

    Image::load(SOIL_IMAGE)
        .select(&bands)
        .divide(Image::constant(PER_MILLE_TO_PERCENT))
        .rename(&names)
}
