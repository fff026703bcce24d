//! Remote dataset identifiers.

/// Annual satellite embedding collection, one 64-band image per year
pub const EMBEDDING_COLLECTION: &str = "GOOGLE/SATELLITE_EMBEDDING/V1/ANNUAL";

/// Monthly climate reanalysis collection
pub const CLIMATE_COLLECTION: &str = "ECMWF/ERA5_LAND/MONTHLY";

/// Global soil property raster
pub const SOIL_IMAGE: &str = "ISRIC/SoilGrids/2021";

/// Soil depth interval reported by the soil KPI
pub const SOIL_DEPTH: &str = "0-5cm";

/// Topsoil fraction bands, in per-mille, paired with the reported name
pub const SOIL_FRACTIONS: [(&str, &str); 3] = [
    ("clay_0-5cm_mean", "clay"),
    ("silt_0-5cm_mean", "silt"),
    ("sand_0-5cm_mean", "sand"),
];
