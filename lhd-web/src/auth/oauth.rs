//! Authorization code flow against the Spotify accounts service
//!
//! **Flow:**
//! 1. `/login` redirects the browser to [`SpotifyAuth::get_authorize_url`]
//! 2. The accounts service redirects back to `/callback?code=..&state=..`
//! 3. [`SpotifyAuth::get_auth_response`] checks `state` and extracts the code
//! 4. [`SpotifyAuth::get_access_token`] exchanges the code and caches the token
//!
//! Later logins reuse the cache through [`SpotifyAuth::get_cached_token`],
//! which refreshes tokens about to expire.

use super::token::{TokenInfo, TokenResponse};
use super::token_store::TokenStore;
use super::AuthError;
use chrono::Utc;
use lhd_common::config::SpotifyCredentials;
use reqwest::Url;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Permissions requested from the user
pub const SCOPES: [&str; 9] = [
    "user-read-recently-played",
    "user-top-read",
    "user-read-playback-position",
    "playlist-modify-public",
    "playlist-modify-private",
    "playlist-read-private",
    "playlist-read-collaborative",
    "user-library-modify",
    "user-library-read",
];

/// Query string of the OAuth redirect
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// OAuth client for one registered application
pub struct SpotifyAuth {
    http_client: reqwest::Client,
    credentials: SpotifyCredentials,
    accounts_url: String,
    store: Arc<dyn TokenStore>,
}

impl SpotifyAuth {
    pub fn new(
        credentials: SpotifyCredentials,
        accounts_url: impl Into<String>,
        store: Arc<dyn TokenStore>,
    ) -> Result<Self, AuthError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AuthError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            credentials,
            accounts_url: accounts_url.into().trim_end_matches('/').to_string(),
            store,
        })
    }

    pub fn scope() -> String {
        SCOPES.join(" ")
    }

    /// URL the browser is sent to for consent
    ///
    /// `show_dialog=true` makes the accounts service ask every time, so
    /// switching accounts after logout works.
    pub fn get_authorize_url(&self, state: &str) -> Result<String, AuthError> {
        let url = Url::parse_with_params(
            &format!("{}/authorize", self.accounts_url),
            &[
                ("client_id", self.credentials.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.credentials.redirect_uri.as_str()),
                ("scope", Self::scope().as_str()),
                ("state", state),
                ("show_dialog", "true"),
            ],
        )
        .map_err(|e| AuthError::ParseError(e.to_string()))?;
        Ok(url.into())
    }

    /// Authorization code from the redirect
    ///
    /// The redirect's `state` must equal `expected_state`, the value issued
    /// with the authorize URL. A provider `error` wins over everything else.
    pub fn get_auth_response(
        &self,
        query: &CallbackQuery,
        expected_state: Option<&str>,
    ) -> Result<String, AuthError> {
        if let Some(error) = &query.error {
            return Err(AuthError::Denied(error.clone()));
        }

        match (query.state.as_deref(), expected_state) {
            (Some(got), Some(expected)) if got == expected => {}
            _ => return Err(AuthError::StateMismatch),
        }

        query
            .code
            .clone()
            .filter(|code| !code.is_empty())
            .ok_or(AuthError::MissingCode)
    }

    /// Exchange an authorization code for a token and cache it
    pub async fn get_access_token(&self, code: &str) -> Result<TokenInfo, AuthError> {
        let token = self
            .request_token(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.credentials.redirect_uri.as_str()),
            ])
            .await?;
        self.store.store_token(&token)?;
        tracing::info!(expires_at = %token.expires_at, "Obtained access token");
        Ok(token)
    }

    /// Cached token, refreshed if it is about to expire
    ///
    /// `None` when nothing usable is cached. A refresh the accounts service
    /// rejects clears the cache rather than failing, so the caller falls
    /// back to a fresh login.
    pub async fn get_cached_token(&self) -> Result<Option<TokenInfo>, AuthError> {
        let Some(token) = self.store.load_token()? else {
            return Ok(None);
        };

        if !token.is_expired() {
            return Ok(Some(token));
        }

        let Some(refresh_token) = token.refresh_token.clone() else {
            tracing::info!("Cached token expired and has no refresh token");
            self.store.clear_token()?;
            return Ok(None);
        };

        match self.refresh_access_token(&refresh_token).await {
            Ok(refreshed) => Ok(Some(refreshed)),
            Err(AuthError::TokenRequest(status, body)) => {
                tracing::warn!(status, body = %body, "Token refresh rejected; clearing cache");
                self.store.clear_token()?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Trade a refresh token for a new access token and cache it
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenInfo, AuthError> {
        let mut token = self
            .request_token(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .await?;

        // The accounts service may omit the refresh token on refresh
        if token.refresh_token.is_none() {
            token.refresh_token = Some(refresh_token.to_string());
        }

        self.store.store_token(&token)?;
        tracing::info!(expires_at = %token.expires_at, "Refreshed access token");
        Ok(token)
    }

    /// Forget the cached token
    pub fn clear_cache(&self) -> Result<(), AuthError> {
        self.store.clear_token()
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenInfo, AuthError> {
        let url = format!("{}/api/token", self.accounts_url);
        tracing::debug!(url = %url, "Requesting token");

        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.credentials.client_id, Some(&self.credentials.client_secret))
            .form(form)
            .send()
            .await
            .map_err(|e| AuthError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AuthError::TokenRequest(status.as_u16(), error_text));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::ParseError(e.to_string()))?;

        body.into_token_info(Utc::now())
    }
}
