//! Spotify Web API response types
//!
//! Only the fields the dashboard reads are modelled. Collections that the
//! API may omit (`images`, `genres`, `artists`) default to empty so a sparse
//! record still deserializes; required identity fields (`id`, `name`) do not,
//! and their absence surfaces as a parse error.

use lhd_common::AudioFeatures;
use serde::{Deserialize, Serialize};

/// Image reference (artist portrait, album cover, profile photo)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Image {
    pub url: String,
    pub height: Option<u32>,
    pub width: Option<u32>,
}

/// URL of the first image, if any
pub fn first_image_url(images: &[Image]) -> Option<&str> {
    images.first().map(|image| image.url.as_str())
}

/// Artist object from `/me/top/artists`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub images: Vec<Image>,
    pub popularity: Option<u32>,
}

impl Artist {
    pub fn image_url(&self) -> Option<&str> {
        first_image_url(&self.images)
    }
}

/// Artist reference embedded in a track
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SimpleArtist {
    pub id: Option<String>,
    pub name: String,
}

/// Album reference embedded in a track
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Album {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
}

/// Track object from `/me/top/tracks`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub album: Option<Album>,
    #[serde(default)]
    pub artists: Vec<SimpleArtist>,
    pub popularity: Option<u32>,
}

impl Track {
    /// Album cover URL
    pub fn image_url(&self) -> Option<&str> {
        self.album
            .as_ref()
            .and_then(|album| first_image_url(&album.images))
    }
}

/// Current user's profile from `/me`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub display_name: Option<String>,
    #[serde(default)]
    pub images: Vec<Image>,
    pub country: Option<String>,
    pub product: Option<String>,
}

impl UserProfile {
    pub fn avatar_url(&self) -> Option<&str> {
        first_image_url(&self.images)
    }

    /// Display name, falling back to the account id
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.id)
    }
}

/// One entry of `/audio-features`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AudioFeaturesRecord {
    pub id: String,
    #[serde(flatten)]
    pub features: AudioFeatures,
}

/// Paged list envelope
#[derive(Debug, Deserialize)]
pub(crate) struct Paging<T> {
    pub items: Vec<T>,
}

/// `/audio-features` envelope; entries are `null` for unknown ids
#[derive(Debug, Deserialize)]
pub(crate) struct AudioFeaturesResponse {
    pub audio_features: Vec<Option<AudioFeaturesRecord>>,
}
