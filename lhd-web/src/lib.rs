//! lhd-web library - Listening History Dashboard web service
//!
//! Logs a user in with Spotify, then serves a dashboard of their top
//! artists, genres and tracks, a radar chart of standardized audio features
//! and a clustering scatter of their long-term favourites.

use axum::extract::FromRef;
use axum::Router;
use lhd_common::analysis::FeatureClusterer;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod auth;
pub mod cli;
pub mod dashboard;
pub mod error;
pub mod session;
pub mod spotify;

use auth::SpotifyAuth;
use session::SessionStore;
use spotify::MusicApi;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// OAuth client and token cache
    pub auth: Arc<SpotifyAuth>,
    /// Listening-history API
    pub api: Arc<dyn MusicApi>,
    pub sessions: SessionStore,
    pub clusterer: Arc<FeatureClusterer>,
}

impl AppState {
    /// Create new application state
    pub fn new(auth: SpotifyAuth, api: Arc<dyn MusicApi>, clusterer: FeatureClusterer) -> Self {
        Self {
            auth: Arc::new(auth),
            api,
            sessions: SessionStore::new(),
            clusterer: Arc::new(clusterer),
        }
    }
}

impl FromRef<AppState> for SessionStore {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    let pages = Router::new()
        .route("/", get(api::serve_index))
        .route("/static/app.js", get(api::serve_app_js))
        .route("/login", get(api::login))
        .route("/callback", get(api::callback))
        .route("/logout", get(api::logout));

    // Data endpoints need a session (enforced by the SessionContext extractor)
    let data = Router::new()
        .route("/api/dashboard", get(api::get_dashboard))
        .route("/api/me", get(api::get_me));

    Router::new()
        .merge(pages)
        .merge(data)
        .merge(api::health_routes())
        .fallback(api::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
