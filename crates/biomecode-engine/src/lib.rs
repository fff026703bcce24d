//! BiomeCode Engine - Remote platform port and adapters
//!
//! This crate defines the [`EarthEngine`] port, the expression graph the
//! remote platform evaluates, and two adapters: the REST client used in
//! production and an in-memory evaluator for development and testing.

pub mod auth;
pub mod expr;
pub mod memory;
pub mod ports;
pub mod rest;

// Re-export main types
pub use auth::{ServiceAccountKey, ServiceAccountTokens, StaticToken, TokenProvider};
pub use expr::{
    Classifier, Dictionary, Expression, FeatureCollection, Filter, Image, ImageCollection,
    Reducer, ValueNode,
};
pub use memory::{MemoryEngine, MemoryFeature, MemoryImage};
pub use ports::EarthEngine;
pub use rest::RestEngine;
