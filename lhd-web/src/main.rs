//! lhd-web (Listening History Dashboard) - Spotify listening analytics
//!
//! Serves a single-user web dashboard: OAuth login against Spotify, then
//! top artists, genres, tracks, audio-feature radar and track clusters.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use lhd_common::analysis::FeatureClusterer;
use lhd_common::config::{load_toml_config, Settings};
use lhd_web::auth::{FileTokenStore, SpotifyAuth};
use lhd_web::cli::Args;
use lhd_web::spotify::SpotifyClient;
use lhd_web::{build_router, AppState};
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is resolved before tracing so the log level can come from it
    let toml = load_toml_config(args.config.as_deref()).context("Failed to load configuration")?;
    let settings = Settings::resolve(args.to_overrides(), toml)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .init();

    info!(
        "Starting Listening History Dashboard (lhd-web) v{}",
        env!("CARGO_PKG_VERSION")
    );
    info!("Token cache: {}", settings.cache_path.display());
    info!("Redirect URI: {}", settings.credentials.redirect_uri);

    let store = Arc::new(FileTokenStore::new(&settings.cache_path));
    let auth = SpotifyAuth::new(settings.credentials.clone(), &settings.accounts_url, store)
        .context("Failed to create OAuth client")?;
    let api = SpotifyClient::new(&settings.api_url).context("Failed to create Spotify client")?;
    let clusterer = FeatureClusterer::new(settings.clustering.clone());

    let state = AppState::new(auth, Arc::new(api), clusterer);
    let app = build_router(state);

    let address = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("lhd-web listening on http://{}", address);
    info!("Health check: http://{}/health", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("lhd-web stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}
