//! Integration tests for layered configuration
//!
//! Precedence is: Environment variables > Config file > Defaults

use biomecode_core::config::{ConfigSource, LayeredConfig, CONFIG_PATH_ENV};
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

const VARS: [&str; 7] = [
    "BIOMECODE_PORT",
    "EE_PROJECT_ID",
    "EE_SA_EMAIL",
    "EE_KEY_PATH",
    "CORS_ORIGINS",
    "EE_API_URL",
    CONFIG_PATH_ENV,
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();

    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
port = 9000
project_id = "file-project"
key_path = "/file/key.json"
"#
    )
    .unwrap();

    env::set_var("BIOMECODE_PORT", "9500");
    env::set_var("EE_PROJECT_ID", "env-project");
    env::set_var("CORS_ORIGINS", "http://localhost:5173,https://biomecode.app");

    let config =
        LayeredConfig::with_defaults().load_from_file(file.path()).unwrap().load_from_env();

    assert_eq!(config.port.value, 9500);
    assert_eq!(config.port.source, ConfigSource::Environment);
    assert_eq!(config.project_id.value.as_deref(), Some("env-project"));
    assert_eq!(config.key_path.value, Some(PathBuf::from("/file/key.json")));
    assert_eq!(config.key_path.source, ConfigSource::File);
    assert_eq!(config.cors_origins.value, vec!["http://localhost:5173", "https://biomecode.app"]);

    clear_env();
}

#[test]
#[serial]
fn test_invalid_port_keeps_previous_value() {
    clear_env();
    env::set_var("BIOMECODE_PORT", "eighty");

    let config = LayeredConfig::with_defaults().load_from_env();

    assert_eq!(config.port.value, 8000);
    assert_eq!(config.port.source, ConfigSource::Default);

    clear_env();
}

#[test]
#[serial]
fn test_empty_credentials_are_ignored() {
    clear_env();
    env::set_var("EE_PROJECT_ID", "  ");
    env::set_var("EE_KEY_PATH", "");

    let config = LayeredConfig::with_defaults().load_from_env();

    assert!(config.remote_settings().is_none());
    assert_eq!(config.project_id.source, ConfigSource::Default);

    clear_env();
}

#[test]
#[serial]
fn test_load_reads_config_path_from_env() {
    clear_env();

    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
project_id = "from-file"
key_path = "/keys/sa.json"
service_account_email = "kpi@from-file.iam.gserviceaccount.com"
"#
    )
    .unwrap();

    env::set_var(CONFIG_PATH_ENV, file.path());
    env::set_var("EE_API_URL", "http://localhost:8089");

    let config = LayeredConfig::load().unwrap();
    let remote = config.remote_settings().unwrap();

    assert_eq!(remote.project_id, "from-file");
    assert_eq!(
        remote.service_account_email.as_deref(),
        Some("kpi@from-file.iam.gserviceaccount.com")
    );
    assert_eq!(remote.api_url, "http://localhost:8089");
    assert_eq!(config.api_url.source, ConfigSource::Environment);

    clear_env();
}

#[test]
#[serial]
fn test_load_fails_on_missing_config_file() {
    clear_env();
    env::set_var(CONFIG_PATH_ENV, "/definitely/not/here.toml");

    assert!(LayeredConfig::load().is_err());

    clear_env();
}
