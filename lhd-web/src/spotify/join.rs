//! Left join of top tracks with their audio features
//!
//! Every track survives the join. Tracks the feature endpoint has nothing
//! for carry `features: None` and are dropped only when building analysis
//! rows (radar chart, clustering).

use super::models::{AudioFeaturesRecord, Track};
use lhd_common::{AudioFeatures, FeatureRow};
use std::collections::HashMap;

/// A track and its audio features, if known
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedTrack {
    pub track: Track,
    pub features: Option<AudioFeatures>,
}

/// Join `tracks` with `features` by track id, keeping track order
pub fn left_join(tracks: Vec<Track>, features: Vec<Option<AudioFeaturesRecord>>) -> Vec<JoinedTrack> {
    let by_id: HashMap<String, AudioFeatures> = features
        .into_iter()
        .flatten()
        .map(|record| (record.id, record.features))
        .collect();

    tracks
        .into_iter()
        .map(|track| {
            let features = by_id.get(&track.id).copied();
            JoinedTrack { track, features }
        })
        .collect()
}

/// Analysis rows for joined tracks that have features
pub fn feature_rows(joined: &[JoinedTrack]) -> Vec<FeatureRow> {
    let rows: Vec<FeatureRow> = joined
        .iter()
        .filter_map(|j| {
            j.features
                .map(|features| FeatureRow::new(j.track.id.clone(), j.track.name.clone(), features))
        })
        .collect();

    let dropped = joined.len() - rows.len();
    if dropped > 0 {
        tracing::info!(dropped, kept = rows.len(), "Dropped tracks without audio features");
    }
    rows
}
