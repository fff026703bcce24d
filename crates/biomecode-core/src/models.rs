pub mod bands;
pub mod climate;
pub mod datasets;
pub mod kpi;
pub mod params;
pub mod region;
pub mod tile;

pub use bands::{BandSet, EMBEDDING_BANDS, EMBEDDING_DIMENSIONS};
pub use climate::{Aggregation, ClimateVariable, DEFAULT_CLIMATE_VARIABLES};
pub use kpi::{ChangeKpi, ClassArea, ClimateKpi, LandcoverOutcome, SoilFractions, SoilKpi};
pub use params::{parse_integer, parse_scale, parse_year, YearRange};
pub use region::{Geometry, Region};
pub use tile::TileHandle;
