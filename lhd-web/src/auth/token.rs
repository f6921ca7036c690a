//! Access token representation

use super::AuthError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Tokens expiring within this many seconds are treated as expired
pub const EXPIRY_MARGIN_SECS: i64 = 60;

/// Cached OAuth token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub scope: String,
    pub expires_in: i64,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl TokenInfo {
    /// True if the token expires within [`EXPIRY_MARGIN_SECS`] of `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - now < Duration::seconds(EXPIRY_MARGIN_SECS)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Token endpoint response body
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub scope: String,
    pub expires_in: i64,
    pub refresh_token: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl TokenResponse {
    /// Stamp the response with an absolute expiry relative to `now`
    ///
    /// An `expires_in` that does not fit a timestamp is a malformed response.
    pub fn into_token_info(self, now: DateTime<Utc>) -> Result<TokenInfo, AuthError> {
        let expires_at = Duration::try_seconds(self.expires_in)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                AuthError::ParseError(format!("expires_in out of range: {}", self.expires_in))
            })?;
        Ok(TokenInfo {
            expires_at,
            access_token: self.access_token,
            token_type: self.token_type,
            scope: self.scope,
            expires_in: self.expires_in,
            refresh_token: self.refresh_token,
        })
    }
}
