//! Unit tests for configuration loading and resolution
//!
//! Covers:
//! - Missing default config file falls back to defaults
//! - Explicit config file must exist and parse
//! - CLI/environment overrides take priority over TOML
//! - Missing credentials produce a configuration error

use lhd_common::config::{
    load_toml_config, Overrides, Settings, TomlConfig, DEFAULT_ACCOUNTS_URL, DEFAULT_API_URL,
    DEFAULT_PORT,
};
use lhd_common::Error;
use std::path::PathBuf;
use tempfile::TempDir;

fn credentials_toml() -> TomlConfig {
    let mut toml = TomlConfig::default();
    toml.spotify.client_id = Some("toml-id".to_string());
    toml.spotify.client_secret = Some("toml-secret".to_string());
    toml
}

#[test]
fn test_explicit_missing_file_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nope.toml");

    let result = load_toml_config(Some(&path));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_parses_full_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
cache_path = "/tmp/lhd-cache.json"

[server]
host = "0.0.0.0"
port = 9000

[spotify]
client_id = "abc"
client_secret = "def"
redirect_uri = "http://localhost:9000/callback"

[logging]
level = "debug"

[clustering]
k_max = 4
seed = 7
"#,
    )
    .unwrap();

    let config = load_toml_config(Some(&path)).unwrap();
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.spotify.client_id.as_deref(), Some("abc"));
    assert_eq!(config.cache_path, Some(PathBuf::from("/tmp/lhd-cache.json")));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.clustering.k_max, 4);
    assert_eq!(config.clustering.seed, 7);
    // Unspecified clustering fields keep defaults
    assert_eq!(config.clustering.max_iterations, 300);
}

#[test]
fn test_partial_file_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "[spotify]\nclient_id = \"abc\"\n").unwrap();

    let config = load_toml_config(Some(&path)).unwrap();
    assert_eq!(config.server.port, DEFAULT_PORT);
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.clustering.k_max, 5);
}

#[test]
fn test_malformed_file_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "[server\nport = ").unwrap();

    assert!(matches!(load_toml_config(Some(&path)), Err(Error::Config(_))));
}

#[test]
fn test_resolve_defaults() {
    let settings = Settings::resolve(Overrides::default(), credentials_toml()).unwrap();

    assert_eq!(settings.port, DEFAULT_PORT);
    assert_eq!(settings.accounts_url, DEFAULT_ACCOUNTS_URL);
    assert_eq!(settings.api_url, DEFAULT_API_URL);
    assert_eq!(settings.credentials.client_id, "toml-id");
    assert_eq!(
        settings.credentials.redirect_uri,
        format!("http://127.0.0.1:{}/callback", DEFAULT_PORT)
    );
    assert!(settings.cache_path.ends_with("token-cache.json"));
}

#[test]
fn test_overrides_take_priority() {
    let overrides = Overrides {
        port: Some(9100),
        client_id: Some("cli-id".to_string()),
        cache_path: Some(PathBuf::from("/tmp/other.json")),
        log_level: Some("warn".to_string()),
        ..Default::default()
    };
    let settings = Settings::resolve(overrides, credentials_toml()).unwrap();

    assert_eq!(settings.port, 9100);
    assert_eq!(settings.credentials.client_id, "cli-id");
    assert_eq!(settings.credentials.client_secret, "toml-secret");
    assert_eq!(settings.cache_path, PathBuf::from("/tmp/other.json"));
    assert_eq!(settings.log_level, "warn");
    assert_eq!(settings.bind_address(), "127.0.0.1:9100");
}

#[test]
fn test_blank_override_falls_through_to_toml() {
    let overrides = Overrides {
        client_id: Some("   ".to_string()),
        ..Default::default()
    };
    let settings = Settings::resolve(overrides, credentials_toml()).unwrap();
    assert_eq!(settings.credentials.client_id, "toml-id");
}

#[test]
fn test_missing_credentials_is_config_error() {
    let result = Settings::resolve(Overrides::default(), TomlConfig::default());
    match result {
        Err(Error::Config(msg)) => assert!(msg.contains("SPOTIFY_CLIENT_ID")),
        other => panic!("expected config error, got {:?}", other),
    }
}
