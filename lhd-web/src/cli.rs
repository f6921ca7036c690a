//! Command-line arguments
//!
//! Every flag can also come from the environment. Values given here win over
//! the TOML file, which wins over compiled defaults.

use clap::Parser;
use lhd_common::config::Overrides;
use std::path::PathBuf;

/// Command-line arguments for lhd-web
#[derive(Parser, Debug, Clone)]
#[command(name = "lhd-web")]
#[command(about = "Listening History Dashboard for Spotify")]
#[command(version)]
pub struct Args {
    /// TOML config file (default: <config dir>/lhd/config.toml)
    #[arg(short, long, env = "LHD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "LHD_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "LHD_PORT")]
    pub port: Option<u16>,

    /// OAuth token cache file
    #[arg(long, env = "LHD_CACHE_PATH")]
    pub cache_path: Option<PathBuf>,

    /// Spotify application client id
    #[arg(long, env = "SPOTIFY_CLIENT_ID", hide_env_values = true)]
    pub client_id: Option<String>,

    /// Spotify application client secret
    #[arg(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// OAuth redirect URI registered with Spotify
    #[arg(long, env = "SPOTIFY_REDIRECT_URI")]
    pub redirect_uri: Option<String>,

    /// Log level when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, env = "LHD_LOG_LEVEL")]
    pub log_level: Option<String>,
}

impl Args {
    pub fn to_overrides(&self) -> Overrides {
        Overrides {
            host: self.host.clone(),
            port: self.port,
            cache_path: self.cache_path.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            redirect_uri: self.redirect_uri.clone(),
            log_level: self.log_level.clone(),
        }
    }
}
