mod request;
mod response;

pub use request::{ChangeRequest, ClimateRequest, LandcoverRequest, SoilRequest, TileRequest};
pub use response::{HealthResponse, LandcoverResponse, NotImplementedResponse, TileResponse};
