//! Dashboard view-models
//!
//! [`build_dashboard`] makes the page's API calls in order and turns each
//! result into a card. Upstream failures are confined to the cards that
//! depend on them; only an invalid token aborts the whole page.
//!
//! **Cards:**
//! 1. Top artists (selected range)
//! 2. Genres of those artists
//! 3. Top tracks (selected range)
//! 4. Standardized audio features of those tracks
//! 5. Clusters of the 50 top long-term tracks

use crate::spotify::{
    feature_rows, left_join, Artist, JoinedTrack, MusicApi, SpotifyError, Track,
};
use lhd_common::analysis::{
    count_genres, melt, standardize_rows, title_case, ClusterError, FeatureClusterer, GenreCount,
    KScore, ProjectedPoint, StandardizedValue,
};
use lhd_common::{TimeRange, FEATURE_NAMES};
use serde::Serialize;
use thiserror::Error;

/// Items per ranked list
pub const TOP_LIMIT: u32 = 10;

/// Tracks fed to the clusterer
pub const CLUSTER_TRACK_LIMIT: u32 = 50;

/// Listening window of the cluster card, whatever range is selected
pub const CLUSTER_TIME_RANGE: TimeRange = TimeRange::LongTerm;

/// Page-level failure
#[derive(Debug, Error)]
pub enum DashboardError {
    /// The token was rejected; the user must log in again
    #[error("Session is no longer authorized: {0}")]
    Unauthenticated(String),
}

/// Render state of one card
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CardState<T> {
    Ready { data: T },
    Error { message: String },
    NotEnoughData { message: String },
}

impl<T> CardState<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, CardState::Ready { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            CardState::Ready { data } => Some(data),
            _ => None,
        }
    }

    fn upstream_error(e: &SpotifyError) -> Self {
        CardState::Error {
            message: format!("Could not load from Spotify: {}", e),
        }
    }
}

/// A titled card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card<T> {
    pub title: &'static str,
    #[serde(flatten)]
    pub state: CardState<T>,
}

impl<T> Card<T> {
    fn new(title: &'static str, state: CardState<T>) -> Self {
        Self { title, state }
    }
}

/// Entry of a ranked list; `image_url` is `None` when the API has no image
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedItem {
    pub rank: usize,
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedList {
    pub items: Vec<RankedItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreChart {
    pub genres: Vec<GenreCount>,
}

/// Long-form standardized features, one trace per track
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarChart {
    /// Axis labels in plotting order
    pub features: Vec<String>,
    pub values: Vec<StandardizedValue>,
    /// Tracks left out for lack of audio features
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterChart {
    pub time_range: TimeRange,
    pub k: usize,
    pub points: Vec<ProjectedPoint>,
    pub scores: Vec<KScore>,
    pub skipped: usize,
}

/// Everything the dashboard page renders
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardPage {
    pub time_range: TimeRange,
    pub top_artists: Card<RankedList>,
    pub top_genres: Card<GenreChart>,
    pub top_tracks: Card<RankedList>,
    pub audio_features: Card<RadarChart>,
    pub clusters: Card<ClusterChart>,
}

/// Pass data through, turn a rejected token into a page failure
fn check_auth<T>(result: Result<T, SpotifyError>) -> Result<Result<T, SpotifyError>, DashboardError> {
    match result {
        Err(SpotifyError::Unauthorized(body)) => Err(DashboardError::Unauthenticated(body)),
        other => Ok(other),
    }
}

/// Audio features joined onto `tracks`
async fn join_features(
    api: &dyn MusicApi,
    token: &str,
    tracks: &[Track],
) -> Result<Result<Vec<JoinedTrack>, SpotifyError>, DashboardError> {
    if tracks.is_empty() {
        return Ok(Ok(Vec::new()));
    }

    let ids: Vec<String> = tracks.iter().map(|t| t.id.clone()).collect();
    let features = check_auth(api.audio_features(token, &ids).await)?;
    Ok(features.map(|features| left_join(tracks.to_vec(), features)))
}

fn artist_cards(
    result: &Result<Vec<Artist>, SpotifyError>,
) -> (Card<RankedList>, Card<GenreChart>) {
    let (ranked, genres) = match result {
        Ok(artists) => {
            let items = artists
                .iter()
                .enumerate()
                .map(|(i, artist)| RankedItem {
                    rank: i + 1,
                    id: artist.id.clone(),
                    name: artist.name.clone(),
                    image_url: artist.image_url().map(String::from),
                })
                .collect();
            let genres = count_genres(artists.iter().map(|a| &a.genres));
            (
                CardState::Ready { data: RankedList { items } },
                CardState::Ready { data: GenreChart { genres } },
            )
        }
        Err(e) => (CardState::upstream_error(e), CardState::upstream_error(e)),
    };
    (
        Card::new("Top Artists", ranked),
        Card::new("Genres of Top Artists", genres),
    )
}

fn track_list(tracks: &[Track]) -> RankedList {
    RankedList {
        items: tracks
            .iter()
            .enumerate()
            .map(|(i, track)| RankedItem {
                rank: i + 1,
                id: track.id.clone(),
                name: track.name.clone(),
                image_url: track.image_url().map(String::from),
            })
            .collect(),
    }
}

fn radar_chart(joined: &[JoinedTrack]) -> CardState<RadarChart> {
    let rows = feature_rows(joined);
    if rows.is_empty() {
        return CardState::NotEnoughData {
            message: "No audio features available for these tracks".to_string(),
        };
    }

    let standardized = standardize_rows(&rows);
    CardState::Ready {
        data: RadarChart {
            features: FEATURE_NAMES.iter().map(|n| title_case(n)).collect(),
            values: melt(&standardized),
            skipped: joined.len() - rows.len(),
        },
    }
}

fn cluster_chart(joined: &[JoinedTrack], clusterer: &FeatureClusterer) -> CardState<ClusterChart> {
    let rows = feature_rows(joined);
    match clusterer.cluster(&rows) {
        Ok(result) => CardState::Ready {
            data: ClusterChart {
                time_range: CLUSTER_TIME_RANGE,
                k: result.k,
                points: result.points,
                scores: result.scores,
                skipped: joined.len() - rows.len(),
            },
        },
        Err(e @ (ClusterError::NonFiniteValue { .. } | ClusterError::Numerical(_))) => {
            tracing::warn!(error = %e, "Clustering failed");
            CardState::Error { message: e.to_string() }
        }
        Err(e) => {
            tracing::info!(error = %e, rows = rows.len(), "Skipping cluster chart");
            CardState::NotEnoughData { message: e.to_string() }
        }
    }
}

/// Fetch and shape everything the dashboard shows for `time_range`
pub async fn build_dashboard(
    api: &dyn MusicApi,
    token: &str,
    time_range: TimeRange,
    clusterer: &FeatureClusterer,
) -> Result<DashboardPage, DashboardError> {
    tracing::debug!(%time_range, "Building dashboard");

    let artists = check_auth(api.top_artists(token, time_range, TOP_LIMIT).await)?;
    let (top_artists, top_genres) = artist_cards(&artists);

    let (top_tracks, audio_features) =
        match check_auth(api.top_tracks(token, time_range, TOP_LIMIT).await)? {
            Ok(tracks) => {
                let radar = match join_features(api, token, &tracks).await? {
                    Ok(joined) => radar_chart(&joined),
                    Err(e) => CardState::upstream_error(&e),
                };
                (CardState::Ready { data: track_list(&tracks) }, radar)
            }
            Err(e) => (CardState::upstream_error(&e), CardState::upstream_error(&e)),
        };

    let clusters = match check_auth(
        api.top_tracks(token, CLUSTER_TIME_RANGE, CLUSTER_TRACK_LIMIT).await,
    )? {
        Ok(tracks) => match join_features(api, token, &tracks).await? {
            Ok(joined) => cluster_chart(&joined, clusterer),
            Err(e) => CardState::upstream_error(&e),
        },
        Err(e) => CardState::upstream_error(&e),
    };

    Ok(DashboardPage {
        time_range,
        top_artists,
        top_genres,
        top_tracks: Card::new("Top Tracks", top_tracks),
        audio_features: Card::new("Top Track Audio Features", audio_features),
        clusters: Card::new("Top Track Clusters", clusters),
    })
}
