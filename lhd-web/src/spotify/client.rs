//! Spotify Web API client
//!
//! Read-only access to the current user's profile, top artists, top tracks
//! and track audio features. No retries: a failed call is reported to the
//! caller, which decides how to render it.

use super::models::{
    Artist, AudioFeaturesRecord, AudioFeaturesResponse, Paging, Track, UserProfile,
};
use async_trait::async_trait;
use lhd_common::TimeRange;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("lhd-web/", env!("CARGO_PKG_VERSION"));

/// Largest page the top-items endpoints accept
pub const MAX_TOP_LIMIT: u32 = 50;

/// Largest id batch `/audio-features` accepts
pub const MAX_FEATURE_IDS: usize = 100;

/// Spotify client errors
#[derive(Debug, Error)]
pub enum SpotifyError {
    /// Token missing, expired or revoked (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Too many requests (429)
    #[error("Rate limit exceeded (retry after {retry_after:?}s)")]
    RateLimitExceeded { retry_after: Option<u64> },

    /// Any other non-success status
    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    /// Network communication error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Response body did not match the expected shape
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl SpotifyError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, SpotifyError::Unauthorized(_))
    }
}

/// Listening-history operations used by the dashboard
///
/// Implemented by [`SpotifyClient`]; tests substitute canned data.
#[async_trait]
pub trait MusicApi: Send + Sync {
    /// Profile of the token's owner
    async fn current_user(&self, token: &str) -> Result<UserProfile, SpotifyError>;

    /// Top artists, most listened first
    async fn top_artists(
        &self,
        token: &str,
        time_range: TimeRange,
        limit: u32,
    ) -> Result<Vec<Artist>, SpotifyError>;

    /// Top tracks, most listened first
    async fn top_tracks(
        &self,
        token: &str,
        time_range: TimeRange,
        limit: u32,
    ) -> Result<Vec<Track>, SpotifyError>;

    /// Audio features for `ids`, one entry per id, `None` where the API has none
    async fn audio_features(
        &self,
        token: &str,
        ids: &[String],
    ) -> Result<Vec<Option<AudioFeaturesRecord>>, SpotifyError>;
}

/// reqwest-backed [`MusicApi`]
pub struct SpotifyClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl SpotifyClient {
    /// Create a client for the API at `base_url` (e.g. `https://api.spotify.com/v1`)
    pub fn new(base_url: impl Into<String>) -> Result<Self, SpotifyError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SpotifyError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, SpotifyError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(url = %url, ?query, "Querying Spotify API");

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await
            .map_err(|e| SpotifyError::NetworkError(e.to_string()))?;

        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SpotifyError::Unauthorized(error_text));
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok());
            tracing::warn!(?retry_after, "Spotify API rate limit hit");
            return Err(SpotifyError::RateLimitExceeded { retry_after });
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SpotifyError::ApiError(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| SpotifyError::ParseError(e.to_string()))
    }
}

fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_TOP_LIMIT)
}

#[async_trait]
impl MusicApi for SpotifyClient {
    async fn current_user(&self, token: &str) -> Result<UserProfile, SpotifyError> {
        let profile: UserProfile = self.get_json(token, "/me", &[]).await?;
        tracing::info!(user = %profile.id, "Fetched current user profile");
        Ok(profile)
    }

    async fn top_artists(
        &self,
        token: &str,
        time_range: TimeRange,
        limit: u32,
    ) -> Result<Vec<Artist>, SpotifyError> {
        let query = [
            ("time_range", time_range.as_str().to_string()),
            ("limit", clamp_limit(limit).to_string()),
        ];
        let page: Paging<Artist> = self.get_json(token, "/me/top/artists", &query).await?;
        tracing::debug!(count = page.items.len(), %time_range, "Fetched top artists");
        Ok(page.items)
    }

    async fn top_tracks(
        &self,
        token: &str,
        time_range: TimeRange,
        limit: u32,
    ) -> Result<Vec<Track>, SpotifyError> {
        let query = [
            ("time_range", time_range.as_str().to_string()),
            ("limit", clamp_limit(limit).to_string()),
        ];
        let page: Paging<Track> = self.get_json(token, "/me/top/tracks", &query).await?;
        tracing::debug!(count = page.items.len(), %time_range, "Fetched top tracks");
        Ok(page.items)
    }

    async fn audio_features(
        &self,
        token: &str,
        ids: &[String],
    ) -> Result<Vec<Option<AudioFeaturesRecord>>, SpotifyError> {
        let mut features = Vec::with_capacity(ids.len());
        for batch in ids.chunks(MAX_FEATURE_IDS) {
            let query = [("ids", batch.join(","))];
            let response: AudioFeaturesResponse =
                self.get_json(token, "/audio-features", &query).await?;
            features.extend(response.audio_features);
        }

        let missing = features.iter().filter(|f| f.is_none()).count();
        if missing > 0 {
            tracing::warn!(missing, requested = ids.len(), "Audio features unavailable for some tracks");
        }
        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = SpotifyClient::new("https://api.spotify.com/v1/");
        assert!(client.is_ok());
        assert_eq!(client.unwrap().base_url, "https://api.spotify.com/v1");
    }

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(clamp_limit(0), 1);
        assert_eq!(clamp_limit(10), 10);
        assert_eq!(clamp_limit(500), MAX_TOP_LIMIT);
    }
}
