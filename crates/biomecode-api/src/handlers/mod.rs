mod change;
mod climate;
mod health;
mod landcover;
mod soil;

pub use change::{change_kpi, change_tiles};
pub use climate::climate_kpi;
pub use health::health_check;
pub use landcover::landcover_kpi;
pub use soil::soil_kpi;
