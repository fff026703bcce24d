//! Remote platform port

use async_trait::async_trait;
use biomecode_core::error::Result;
use biomecode_core::models::TileHandle;
use serde_json::Value as JsonValue;

use crate::expr::Expression;

/// Port for evaluating expressions on the remote geospatial platform.
///
/// One handle is built at startup and shared by every request; implementors
/// must not rely on per-request state.
#[async_trait]
pub trait EarthEngine: Send + Sync {
    /// Evaluate an expression and return its JSON value
    async fn compute_value(&self, expression: &Expression) -> Result<JsonValue>;

    /// Register an image expression as a map layer
    async fn create_map(&self, expression: &Expression) -> Result<TileHandle>;

    /// `{z}/{x}/{y}` URL template for a registered map layer
    fn tile_url(&self, handle: &TileHandle) -> String;

    /// Short adapter name for logs
    fn name(&self) -> &str;
}
