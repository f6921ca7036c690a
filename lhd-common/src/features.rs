//! Audio-feature data model
//!
//! The music API describes every track with a fixed set of numeric
//! descriptors. [`AudioFeatures`] holds the nine descriptors used by the
//! dashboard; [`FeatureRow`] pairs them with the track identity.

use serde::{Deserialize, Serialize};

/// Number of audio-feature columns
pub const FEATURE_COUNT: usize = 9;

/// Column names, in matrix order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "acousticness",
    "danceability",
    "energy",
    "instrumentalness",
    "liveness",
    "loudness",
    "speechiness",
    "tempo",
    "valence",
];

/// Per-track audio descriptors
///
/// Field ranges are defined by the music API: most are 0.0-1.0,
/// `loudness` is in dB (typically -60..0) and `tempo` in BPM.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    /// Confidence the track is acoustic
    pub acousticness: f64,
    /// Suitability for dancing
    pub danceability: f64,
    /// Perceived intensity and activity
    pub energy: f64,
    /// Likelihood the track has no vocals
    pub instrumentalness: f64,
    /// Presence of an audience in the recording
    pub liveness: f64,
    /// Overall loudness in dB
    pub loudness: f64,
    /// Presence of spoken words
    pub speechiness: f64,
    /// Estimated tempo in BPM
    pub tempo: f64,
    /// Musical positiveness
    pub valence: f64,
}

impl AudioFeatures {
    /// Values in [`FEATURE_NAMES`] order
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.acousticness,
            self.danceability,
            self.energy,
            self.instrumentalness,
            self.liveness,
            self.loudness,
            self.speechiness,
            self.tempo,
            self.valence,
        ]
    }

    /// Build from values in [`FEATURE_NAMES`] order
    pub fn from_array(values: [f64; FEATURE_COUNT]) -> Self {
        Self {
            acousticness: values[0],
            danceability: values[1],
            energy: values[2],
            instrumentalness: values[3],
            liveness: values[4],
            loudness: values[5],
            speechiness: values[6],
            tempo: values[7],
            valence: values[8],
        }
    }
}

/// One track's identity plus its audio features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    /// Track id
    pub id: String,
    /// Track name
    pub name: String,
    /// Audio descriptors
    pub features: AudioFeatures,
}

impl FeatureRow {
    pub fn new(id: impl Into<String>, name: impl Into<String>, features: AudioFeatures) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            features,
        }
    }
}

/// Extract the N×9 feature matrix from a batch of rows
pub fn feature_matrix(rows: &[FeatureRow]) -> Vec<[f64; FEATURE_COUNT]> {
    rows.iter().map(|row| row.features.to_array()).collect()
}
