use axum::http::HeaderValue;
use biomecode_core::config::{LayeredConfig, RemoteSettings};
use tower_http::cors::{Any, CorsLayer};

/// API server configuration resolved from the layered configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub port: u16,
    pub cors_origins: Vec<String>,
    /// Present when the Earth Engine REST engine can be built
    pub remote: Option<RemoteSettings>,
}

impl ApiConfig {
    pub fn from_layered(config: &LayeredConfig) -> Self {
        Self {
            port: config.port.value,
            cors_origins: config.cors_origins.value.clone(),
            remote: config.remote_settings(),
        }
    }

    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }

    /// Check if the Earth Engine REST engine is configured
    pub fn uses_remote_engine(&self) -> bool {
        self.remote.is_some()
    }

    /// CORS policy; `*` anywhere in the origin list allows every origin
    pub fn cors_layer(&self) -> CorsLayer {
        let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

        if self.cors_origins.is_empty() || self.cors_origins.iter().any(|o| o == "*") {
            return layer.allow_origin(Any);
        }

        let origins: Vec<HeaderValue> = self
            .cors_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();

        layer.allow_origin(origins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biomecode_core::config::{ConfigSource, ConfigValue};
    use std::path::PathBuf;

    #[test]
    fn test_from_layered_defaults() {
        let config = ApiConfig::from_layered(&LayeredConfig::with_defaults());

        assert_eq!(config.port, 8000);
        assert_eq!(config.cors_origins, vec!["*".to_string()]);
        assert!(!config.uses_remote_engine());
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
    }

    #[test]
    fn test_from_layered_with_credentials() {
        let mut layered = LayeredConfig::with_defaults();
        layered.project_id = ConfigValue::new(Some("demo".to_string()), ConfigSource::Environment);
        layered.key_path =
            ConfigValue::new(Some(PathBuf::from("/keys/sa.json")), ConfigSource::Environment);

        let config = ApiConfig::from_layered(&layered);
        let remote = config.remote.expect("remote settings");
        assert_eq!(remote.project_id, "demo");
        assert_eq!(remote.key_path, PathBuf::from("/keys/sa.json"));
    }
}
