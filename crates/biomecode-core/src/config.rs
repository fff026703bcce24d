use crate::error::{BiomeError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Public Earth Engine REST endpoint
pub const DEFAULT_API_URL: &str = "https://earthengine.googleapis.com";

/// Environment variable naming an optional TOML config file
pub const CONFIG_PATH_ENV: &str = "BIOMECODE_CONFIG";

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Settings needed to reach the remote platform with a service account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSettings {
    pub project_id: String,
    pub key_path: PathBuf,
    /// Overrides the `client_email` found in the key file
    pub service_account_email: Option<String>,
    pub api_url: String,
}

/// Layered configuration for BiomeCode
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub port: ConfigValue<u16>,
    pub project_id: ConfigValue<Option<String>>,
    pub service_account_email: ConfigValue<Option<String>>,
    pub key_path: ConfigValue<Option<PathBuf>>,
    pub cors_origins: ConfigValue<Vec<String>>,
    pub api_url: ConfigValue<String>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            port: ConfigValue::new(8000, ConfigSource::Default),
            project_id: ConfigValue::new(None, ConfigSource::Default),
            service_account_email: ConfigValue::new(None, ConfigSource::Default),
            key_path: ConfigValue::new(None, ConfigSource::Default),
            cors_origins: ConfigValue::new(vec!["*".to_string()], ConfigSource::Default),
            api_url: ConfigValue::new(DEFAULT_API_URL.to_string(), ConfigSource::Default),
        }
    }

    /// Defaults, then the file named by `BIOMECODE_CONFIG` if set, then the environment
    pub fn load() -> Result<Self> {
        let config = Self::with_defaults();
        let config = match env::var(CONFIG_PATH_ENV) {
            Ok(path) => config.load_from_file(path)?,
            Err(_) => config,
        };
        Ok(config.load_from_env())
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| BiomeError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| BiomeError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(port) = file_config.port {
            self.port.update(port, ConfigSource::File);
        }

        if let Some(project_id) = file_config.project_id {
            self.project_id.update(Some(project_id), ConfigSource::File);
        }

        if let Some(email) = file_config.service_account_email {
            self.service_account_email.update(Some(email), ConfigSource::File);
        }

        if let Some(key_path) = file_config.key_path {
            self.key_path.update(Some(key_path), ConfigSource::File);
        }

        if let Some(origins) = file_config.cors_origins {
            self.cors_origins.update(origins, ConfigSource::File);
        }

        if let Some(api_url) = file_config.api_url {
            self.api_url.update(api_url, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // BIOMECODE_PORT
        if let Ok(port_str) = env::var("BIOMECODE_PORT") {
            match port_str.parse::<u16>() {
                Ok(port) => self.port.update(port, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid BIOMECODE_PORT value '{}': expected a TCP port number",
                    port_str
                ),
            }
        }

        // EE_PROJECT_ID
        if let Some(project_id) = non_empty_var("EE_PROJECT_ID") {
            self.project_id.update(Some(project_id), ConfigSource::Environment);
        }

        // EE_SA_EMAIL
        if let Some(email) = non_empty_var("EE_SA_EMAIL") {
            self.service_account_email.update(Some(email), ConfigSource::Environment);
        }

        // EE_KEY_PATH
        if let Some(key_path) = non_empty_var("EE_KEY_PATH") {
            self.key_path.update(Some(PathBuf::from(key_path)), ConfigSource::Environment);
        }

        // CORS_ORIGINS
        if let Ok(origins) = env::var("CORS_ORIGINS") {
            self.cors_origins.update(parse_cors_origins(&origins), ConfigSource::Environment);
        }

        // EE_API_URL
        if let Some(api_url) = non_empty_var("EE_API_URL") {
            self.api_url.update(api_url, ConfigSource::Environment);
        }

        self
    }

    /// Remote platform settings, present once a project and a key are configured
    pub fn remote_settings(&self) -> Option<RemoteSettings> {
        let project_id = self.project_id.value.clone()?;
        let key_path = self.key_path.value.clone()?;

        Some(RemoteSettings {
            project_id,
            key_path,
            service_account_email: self.service_account_email.value.clone(),
            api_url: self.api_url.value.clone(),
        })
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    port: Option<u16>,
    project_id: Option<String>,
    service_account_email: Option<String>,
    key_path: Option<PathBuf>,
    cors_origins: Option<Vec<String>>,
    api_url: Option<String>,
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parse a comma separated origin list; an empty list means any origin
pub fn parse_cors_origins(s: &str) -> Vec<String> {
    let origins: Vec<String> =
        s.split(',').map(str::trim).filter(|o| !o.is_empty()).map(String::from).collect();

    if origins.is_empty() {
        vec!["*".to_string()]
    } else {
        origins
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = LayeredConfig::with_defaults();
        assert_eq!(config.port.value, 8000);
        assert_eq!(config.port.source, ConfigSource::Default);
        assert_eq!(config.cors_origins.value, vec!["*"]);
        assert_eq!(config.api_url.value, DEFAULT_API_URL);
        assert!(config.remote_settings().is_none());
    }

    #[test]
    fn test_config_precedence() {
        let mut value = ConfigValue::new(100, ConfigSource::Default);

        // File should override default
        value.update(200, ConfigSource::File);
        assert_eq!(value.value, 200);
        assert_eq!(value.source, ConfigSource::File);

        // Environment should override file
        value.update(300, ConfigSource::Environment);
        assert_eq!(value.value, 300);
        assert_eq!(value.source, ConfigSource::Environment);

        // Lower precedence should not override
        value.update(400, ConfigSource::File);
        assert_eq!(value.value, 300);
        assert_eq!(value.source, ConfigSource::Environment);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
port = 9100
project_id = "biomecode-dev"
key_path = "/secrets/sa.json"
cors_origins = ["http://localhost:5173", "https://app.example.org"]
"#
        )
        .unwrap();

        let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

        assert_eq!(config.port.value, 9100);
        assert_eq!(config.port.source, ConfigSource::File);
        assert_eq!(config.cors_origins.value.len(), 2);

        let remote = config.remote_settings().unwrap();
        assert_eq!(remote.project_id, "biomecode-dev");
        assert_eq!(remote.key_path, PathBuf::from("/secrets/sa.json"));
        assert_eq!(remote.service_account_email, None);
        assert_eq!(remote.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_load_from_invalid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "port = \"not a number\"").unwrap();

        let err = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, BiomeError::ConfigInvalid { .. }));
    }

    #[test]
    fn test_parse_cors_origins() {
        assert_eq!(parse_cors_origins("*"), vec!["*"]);
        assert_eq!(
            parse_cors_origins("http://a.test, http://b.test,"),
            vec!["http://a.test", "http://b.test"]
        );
        assert_eq!(parse_cors_origins(" , "), vec!["*"]);
    }
}
