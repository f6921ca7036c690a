//! HTTP API handlers for lhd-web

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod ui;

pub use auth::{callback, login, logout};
pub use dashboard::{get_dashboard, get_me};
pub use health::health_routes;
pub use ui::{serve_app_js, serve_index};

use crate::error::ApiError;
use axum::http::Uri;

/// Fallback for unknown routes
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}
