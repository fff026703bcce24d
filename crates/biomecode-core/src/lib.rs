//! BiomeCode Core - Domain models, errors, and configuration
//!
//! This crate contains the request-scoped domain types shared by the engine,
//! query and API crates. Nothing here talks to the network.

pub mod config;
pub mod error;
pub mod models;

pub use error::{BiomeError, Result};
