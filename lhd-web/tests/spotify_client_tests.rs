//! Integration tests for the Spotify API client against a local mock server
//!
//! Covers:
//! - Bearer token forwarding, 401 mapping
//! - 429 mapping with Retry-After
//! - Other statuses, malformed bodies, unreachable hosts
//! - Limit clamping to 1..=50
//! - Audio features: null entries, batching by 100 ids

mod helpers;

use axum::{
    extract::Query,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use helpers::spawn_server;
use lhd_common::TimeRange;
use lhd_web::spotify::{MusicApi, SpotifyClient, SpotifyError};
use serde_json::{json, Value};
use std::collections::HashMap;

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(String::from)
}

fn check_token(headers: &HeaderMap) -> Result<(), Response> {
    match bearer(headers).as_deref() {
        Some("good") => Ok(()),
        Some("ratelimited") => Err((
            StatusCode::TOO_MANY_REQUESTS,
            [("retry-after", "7")],
            "slow down",
        )
            .into_response()),
        Some("broken") => Err((StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response()),
        Some("garbage") => Err((StatusCode::OK, "{not json").into_response()),
        _ => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": {"status": 401, "message": "Invalid access token"}})),
        )
            .into_response()),
    }
}

fn limit_of(params: &HashMap<String, String>) -> usize {
    params.get("limit").and_then(|l| l.parse().ok()).unwrap_or(20)
}

async fn me(headers: HeaderMap) -> Response {
    if let Err(response) = check_token(&headers) {
        return response;
    }
    Json(json!({
        "id": "user1",
        "display_name": "Mock User",
        "images": [{"url": "https://img/me.jpg", "height": 300, "width": 300}],
        "country": "SE",
        "product": "premium",
        "followers": {"total": 3}
    }))
    .into_response()
}

async fn top_artists(headers: HeaderMap, Query(params): Query<HashMap<String, String>>) -> Response {
    if let Err(response) = check_token(&headers) {
        return response;
    }
    // One item per requested slot, echoing the time range in the genre
    let range = params.get("time_range").cloned().unwrap_or_default();
    let items: Vec<Value> = (0..limit_of(&params))
        .map(|i| json!({"id": format!("a{}", i), "name": format!("Artist {}", i), "genres": [range.clone()]}))
        .collect();
    Json(json!({"items": items, "total": items.len()})).into_response()
}

async fn top_tracks(headers: HeaderMap, Query(params): Query<HashMap<String, String>>) -> Response {
    if let Err(response) = check_token(&headers) {
        return response;
    }
    let items: Vec<Value> = (0..limit_of(&params))
        .map(|i| json!({"id": format!("t{}", i), "name": format!("Track {}", i), "album": null}))
        .collect();
    Json(json!({"items": items})).into_response()
}

async fn audio_features(headers: HeaderMap, Query(params): Query<HashMap<String, String>>) -> Response {
    if let Err(response) = check_token(&headers) {
        return response;
    }
    let ids = params.get("ids").cloned().unwrap_or_default();
    if ids.split(',').count() > 100 {
        return (StatusCode::BAD_REQUEST, "too many ids").into_response();
    }
    let entries: Vec<Value> = ids
        .split(',')
        .map(|id| {
            if id.starts_with("missing") {
                Value::Null
            } else {
                json!({
                    "id": id, "acousticness": 0.1, "danceability": 0.6, "energy": 0.8,
                    "instrumentalness": 0.0, "liveness": 0.2, "loudness": -5.5,
                    "speechiness": 0.05, "tempo": 128.0, "valence": 0.4,
                    "key": 5, "mode": 1, "duration_ms": 200000
                })
            }
        })
        .collect();
    Json(json!({"audio_features": entries})).into_response()
}

async fn mock_client() -> SpotifyClient {
    let router = Router::new()
        .route("/v1/me", get(me))
        .route("/v1/me/top/artists", get(top_artists))
        .route("/v1/me/top/tracks", get(top_tracks))
        .route("/v1/audio-features", get(audio_features));
    let base = spawn_server(router).await;
    SpotifyClient::new(format!("{}/v1", base)).unwrap()
}

#[tokio::test]
async fn test_current_user() {
    let client = mock_client().await;
    let user = client.current_user("good").await.unwrap();
    assert_eq!(user.id, "user1");
    assert_eq!(user.label(), "Mock User");
    assert_eq!(user.avatar_url(), Some("https://img/me.jpg"));
}

#[tokio::test]
async fn test_invalid_token_is_unauthorized() {
    let client = mock_client().await;
    let err = client.current_user("expired").await.unwrap_err();
    assert!(err.is_unauthorized(), "got {:?}", err);

    let err = client
        .top_tracks("expired", TimeRange::ShortTerm, 10)
        .await
        .unwrap_err();
    assert!(matches!(err, SpotifyError::Unauthorized(_)));
}

#[tokio::test]
async fn test_rate_limit_mapping() {
    let client = mock_client().await;
    let err = client
        .top_artists("ratelimited", TimeRange::MediumTerm, 10)
        .await
        .unwrap_err();
    match err {
        SpotifyError::RateLimitExceeded { retry_after } => assert_eq!(retry_after, Some(7)),
        other => panic!("expected rate limit, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_mapping() {
    let client = mock_client().await;
    match client.current_user("broken").await.unwrap_err() {
        SpotifyError::ApiError(status, body) => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let client = mock_client().await;
    let err = client.current_user("garbage").await.unwrap_err();
    assert!(matches!(err, SpotifyError::ParseError(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_unreachable_host_is_network_error() {
    let client = SpotifyClient::new("http://127.0.0.1:1/v1").unwrap();
    let err = client.current_user("good").await.unwrap_err();
    assert!(matches!(err, SpotifyError::NetworkError(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_limit_clamping() {
    let client = mock_client().await;

    let artists = client.top_artists("good", TimeRange::LongTerm, 500).await.unwrap();
    assert_eq!(artists.len(), 50);

    let artists = client.top_artists("good", TimeRange::LongTerm, 0).await.unwrap();
    assert_eq!(artists.len(), 1);

    let tracks = client.top_tracks("good", TimeRange::LongTerm, 10).await.unwrap();
    assert_eq!(tracks.len(), 10);
    assert_eq!(tracks[0].image_url(), None);
}

#[tokio::test]
async fn test_time_range_forwarded() {
    let client = mock_client().await;
    let artists = client.top_artists("good", TimeRange::ShortTerm, 2).await.unwrap();
    assert_eq!(artists[0].genres, vec!["short_term".to_string()]);
}

#[tokio::test]
async fn test_audio_features_with_null_entry() {
    let client = mock_client().await;
    let ids = vec!["t1".to_string(), "missing-1".to_string(), "t3".to_string()];
    let features = client.audio_features("good", &ids).await.unwrap();

    assert_eq!(features.len(), 3);
    let first = features[0].as_ref().unwrap();
    assert_eq!(first.id, "t1");
    assert_eq!(first.features.tempo, 128.0);
    assert_eq!(first.features.loudness, -5.5);
    assert!(features[1].is_none());
    assert_eq!(features[2].as_ref().unwrap().id, "t3");
}

#[tokio::test]
async fn test_audio_features_batches_large_requests() {
    let client = mock_client().await;
    let ids: Vec<String> = (0..150).map(|i| format!("t{}", i)).collect();
    let features = client.audio_features("good", &ids).await.unwrap();

    assert_eq!(features.len(), 150);
    assert_eq!(features[149].as_ref().unwrap().id, "t149");
}
