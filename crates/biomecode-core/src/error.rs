//! Error types for BiomeCode

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BiomeError {
    // Request errors
    #[error("Malformed input: {reason}")]
    MalformedInput { reason: String },

    #[error("No data: {reason}")]
    NoData { reason: String },

    // Remote platform errors
    #[error("Remote evaluation failed ({status}): {message}")]
    RemoteEvaluation { status: String, message: String },

    #[error("Remote platform unavailable: {reason}")]
    RemoteUnavailable { reason: String },

    #[error("Authentication failed: {reason}")]
    Authentication { reason: String },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl BiomeError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedInput { reason: reason.into() }
    }

    pub fn no_data(reason: impl Into<String>) -> Self {
        Self::NoData { reason: reason.into() }
    }
}

impl From<serde_json::Error> for BiomeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BiomeError>;
