//! Configuration loading and resolution
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument / environment variable (merged by the binary's CLI parser)
//! 2. TOML config file
//! 3. Compiled defaults
//!
//! A missing config file is not an error: the dashboard starts on defaults
//! as long as Spotify credentials arrive from somewhere.

use crate::analysis::ClusterConfig;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8050;
pub const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.spotify.com";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub spotify: SpotifyConfig,
    /// OAuth token cache file
    #[serde(default)]
    pub cache_path: Option<PathBuf>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub clustering: ClusterConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Spotify application credentials and endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpotifyConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: Option<String>,
    /// Accounts service base URL (authorize + token endpoints)
    pub accounts_url: Option<String>,
    /// Web API base URL
    pub api_url: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub cache_path: Option<PathBuf>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: Option<String>,
    pub log_level: Option<String>,
}

/// OAuth client credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Fully resolved runtime settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub cache_path: PathBuf,
    pub credentials: SpotifyCredentials,
    pub accounts_url: String,
    pub api_url: String,
    pub log_level: String,
    pub clustering: ClusterConfig,
}

impl Settings {
    /// Merge overrides over TOML values over defaults
    pub fn resolve(overrides: Overrides, toml: TomlConfig) -> Result<Self> {
        let host = overrides.host.unwrap_or(toml.server.host);
        let port = overrides.port.unwrap_or(toml.server.port);

        let client_id = pick("client_id", overrides.client_id, toml.spotify.client_id)
            .ok_or_else(|| missing_credential("client_id", "SPOTIFY_CLIENT_ID"))?;
        let client_secret = pick("client_secret", overrides.client_secret, toml.spotify.client_secret)
            .ok_or_else(|| missing_credential("client_secret", "SPOTIFY_CLIENT_SECRET"))?;
        let redirect_uri = pick("redirect_uri", overrides.redirect_uri, toml.spotify.redirect_uri)
            .unwrap_or_else(|| format!("http://{}:{}/callback", host, port));

        let cache_path = overrides
            .cache_path
            .or(toml.cache_path)
            .unwrap_or_else(default_cache_path);

        Ok(Self {
            host,
            port,
            cache_path,
            credentials: SpotifyCredentials {
                client_id,
                client_secret,
                redirect_uri,
            },
            accounts_url: toml
                .spotify
                .accounts_url
                .unwrap_or_else(|| DEFAULT_ACCOUNTS_URL.to_string()),
            api_url: toml
                .spotify
                .api_url
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            log_level: overrides.log_level.unwrap_or(toml.logging.level),
            clustering: toml.clustering,
        })
    }

    /// `host:port` string for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// First non-blank value, override before TOML
fn pick(name: &str, override_value: Option<String>, toml_value: Option<String>) -> Option<String> {
    let override_value = override_value.filter(|v| is_valid_value(v));
    let toml_value = toml_value.filter(|v| is_valid_value(v));
    if override_value.is_some() && toml_value.is_some() {
        info!("{} set in both CLI/environment and TOML; using CLI/environment", name);
    }
    override_value.or(toml_value)
}

fn missing_credential(field: &str, env_var: &str) -> Error {
    Error::Config(format!(
        "Spotify {field} not configured. Provide it with one of:\n\
         1. Environment: {env_var}=...\n\
         2. TOML config: [spotify] {field} = \"...\"\n\
         \n\
         Register an application at https://developer.spotify.com/dashboard"
    ))
}

/// Reject empty or whitespace-only values
pub fn is_valid_value(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Platform config file location: `<config_dir>/lhd/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("lhd").join("config.toml"))
}

/// Platform token cache location: `<data_local_dir>/lhd/token-cache.json`
pub fn default_cache_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("lhd"))
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("token-cache.json")
}

/// Load the TOML config
///
/// An explicitly requested file must exist and parse. Without an explicit
/// path the platform default is tried; if it is absent, defaults are used.
pub fn load_toml_config(path: Option<&Path>) -> Result<TomlConfig> {
    let (path, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => match default_config_path() {
            Some(p) => (p, false),
            None => {
                warn!("Could not determine config directory; using defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    if !path.exists() {
        if explicit {
            return Err(Error::Config(format!("Config file not found: {}", path.display())));
        }
        info!("No config file at {}; using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(&path)?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}
