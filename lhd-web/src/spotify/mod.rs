//! Spotify Web API integration

pub mod client;
pub mod join;
pub mod models;

pub use client::{MusicApi, SpotifyClient, SpotifyError, MAX_TOP_LIMIT};
pub use join::{feature_rows, left_join, JoinedTrack};
pub use models::{Album, Artist, AudioFeaturesRecord, Image, SimpleArtist, Track, UserProfile};
