//! Shared fixtures for lhd-web integration tests
//!
//! - `MockMusicApi`: canned listening history, records every call
//! - Artist/track/feature builders
//! - `spawn_server`: serve an axum router on an ephemeral local port

#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use lhd_common::{AudioFeatures, TimeRange};
use lhd_web::spotify::{
    Album, Artist, AudioFeaturesRecord, Image, MusicApi, SpotifyError, Track, UserProfile,
};
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory listening history
#[derive(Default)]
pub struct MockMusicApi {
    pub user: Option<UserProfile>,
    pub artists: Vec<Artist>,
    pub tracks: Vec<Track>,
    pub features: HashMap<String, AudioFeatures>,
    /// Answer every call with 401
    pub reject_token: bool,
    /// Fail top-artist calls with this status
    pub artists_status: Option<u16>,
    /// Fail audio-feature calls with a rate limit
    pub rate_limit_features: bool,
    pub calls: Mutex<Vec<String>>,
}

impl MockMusicApi {
    pub fn new() -> Self {
        Self {
            user: Some(user("user1", "Test Listener")),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<(), SpotifyError> {
        self.calls.lock().unwrap().push(call);
        if self.reject_token {
            return Err(SpotifyError::Unauthorized("The access token expired".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MusicApi for MockMusicApi {
    async fn current_user(&self, token: &str) -> Result<UserProfile, SpotifyError> {
        self.record(format!("current_user {}", token))?;
        self.user
            .clone()
            .ok_or_else(|| SpotifyError::ApiError(404, "no user".to_string()))
    }

    async fn top_artists(
        &self,
        _token: &str,
        time_range: TimeRange,
        limit: u32,
    ) -> Result<Vec<Artist>, SpotifyError> {
        self.record(format!("top_artists {} {}", time_range, limit))?;
        if let Some(status) = self.artists_status {
            return Err(SpotifyError::ApiError(status, "upstream failure".to_string()));
        }
        Ok(self.artists.iter().take(limit as usize).cloned().collect())
    }

    async fn top_tracks(
        &self,
        _token: &str,
        time_range: TimeRange,
        limit: u32,
    ) -> Result<Vec<Track>, SpotifyError> {
        self.record(format!("top_tracks {} {}", time_range, limit))?;
        Ok(self.tracks.iter().take(limit as usize).cloned().collect())
    }

    async fn audio_features(
        &self,
        _token: &str,
        ids: &[String],
    ) -> Result<Vec<Option<AudioFeaturesRecord>>, SpotifyError> {
        self.record(format!("audio_features {}", ids.len()))?;
        if self.rate_limit_features {
            return Err(SpotifyError::RateLimitExceeded { retry_after: Some(5) });
        }
        Ok(ids
            .iter()
            .map(|id| {
                self.features.get(id).map(|features| AudioFeaturesRecord {
                    id: id.clone(),
                    features: *features,
                })
            })
            .collect())
    }
}

pub fn user(id: &str, display_name: &str) -> UserProfile {
    UserProfile {
        id: id.to_string(),
        display_name: Some(display_name.to_string()),
        images: vec![image("https://img.example/avatar.jpg")],
        country: Some("SE".to_string()),
        product: Some("premium".to_string()),
    }
}

pub fn image(url: &str) -> Image {
    Image {
        url: url.to_string(),
        height: Some(640),
        width: Some(640),
    }
}

pub fn artist(id: &str, name: &str, genres: &[&str]) -> Artist {
    Artist {
        id: id.to_string(),
        name: name.to_string(),
        genres: genres.iter().map(|g| g.to_string()).collect(),
        images: vec![image(&format!("https://img.example/{}.jpg", id))],
        popularity: Some(50),
    }
}

pub fn track(id: &str, name: &str) -> Track {
    Track {
        id: id.to_string(),
        name: name.to_string(),
        album: Some(Album {
            id: Some(format!("album-{}", id)),
            name: format!("Album of {}", name),
            images: vec![image(&format!("https://img.example/album-{}.jpg", id))],
        }),
        artists: Vec::new(),
        popularity: Some(40),
    }
}

/// Distinct, plausible audio features for track number `i`
pub fn features(i: usize) -> AudioFeatures {
    let mut state = (i as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let mut next = || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((state >> 11) as f64) / ((1u64 << 53) as f64)
    };
    AudioFeatures {
        acousticness: next(),
        danceability: next(),
        energy: next(),
        instrumentalness: next(),
        liveness: next(),
        loudness: -30.0 + 25.0 * next(),
        speechiness: next(),
        tempo: 70.0 + 100.0 * next(),
        valence: next(),
    }
}

/// `n` tracks, all with audio features
pub fn tracks_with_features(n: usize) -> (Vec<Track>, HashMap<String, AudioFeatures>) {
    let tracks: Vec<Track> = (0..n)
        .map(|i| track(&format!("t{}", i), &format!("Track {}", i)))
        .collect();
    let features = (0..n).map(|i| (format!("t{}", i), features(i))).collect();
    (tracks, features)
}

/// Serve `router` on 127.0.0.1 and return its base URL
pub async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", address)
}
