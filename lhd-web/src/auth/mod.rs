//! Spotify OAuth (authorization code flow) and token caching

pub mod oauth;
pub mod token;
pub mod token_store;

pub use oauth::{CallbackQuery, SpotifyAuth, SCOPES};
pub use token::{TokenInfo, EXPIRY_MARGIN_SECS};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};

use thiserror::Error;

/// OAuth errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// User declined, or the provider returned an error on the redirect
    #[error("Authorization denied: {0}")]
    Denied(String),

    /// Redirect `state` does not match a login this server started
    #[error("OAuth state mismatch")]
    StateMismatch,

    /// Redirect carried neither a code nor an error
    #[error("Authorization response has no code")]
    MissingCode,

    /// Token endpoint rejected the request
    #[error("Token request failed ({0}): {1}")]
    TokenRequest(u16, String),

    /// Network communication error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Token endpoint response did not parse
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Token cache could not be read or written
    #[error("Token storage error: {0}")]
    Storage(String),
}
