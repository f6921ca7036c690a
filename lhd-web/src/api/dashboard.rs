//! Dashboard data and profile endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use lhd_common::TimeRange;
use serde::Deserialize;
use std::str::FromStr;

use crate::auth::AuthError;
use crate::dashboard::{build_dashboard, DashboardError, DashboardPage};
use crate::error::{ApiError, ApiResult};
use crate::session::SessionContext;
use crate::spotify::UserProfile;
use crate::AppState;

/// Query parameters for GET /api/dashboard
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub time_range: Option<String>,
}

impl DashboardQuery {
    /// Selected range, medium term when absent or blank
    pub fn time_range(&self) -> ApiResult<TimeRange> {
        match self.time_range.as_deref().map(str::trim) {
            None | Some("") => Ok(TimeRange::default()),
            Some(value) => Ok(TimeRange::from_str(value)?),
        }
    }
}

/// Access token of `session`, refreshed first if it is about to expire
async fn session_token(state: &AppState, session: &SessionContext) -> ApiResult<String> {
    if !session.token.is_expired() {
        return Ok(session.token.access_token.clone());
    }

    let Some(refresh_token) = session.token.refresh_token.as_deref() else {
        state.sessions.remove(&session.id).await;
        return Err(ApiError::Unauthorized("Session expired".to_string()));
    };

    match state.auth.refresh_access_token(refresh_token).await {
        Ok(token) => {
            let access_token = token.access_token.clone();
            state.sessions.update_token(&session.id, token).await;
            Ok(access_token)
        }
        Err(AuthError::TokenRequest(status, _)) => {
            tracing::info!(status, session = %session.id, "Session token could not be refreshed");
            state.sessions.remove(&session.id).await;
            Err(ApiError::Unauthorized("Session expired".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /api/dashboard?time_range=short_term|medium_term|long_term
///
/// 401 when there is no session or Spotify rejects its token; the session
/// is dropped in the latter case.
pub async fn get_dashboard(
    State(state): State<AppState>,
    session: SessionContext,
    Query(query): Query<DashboardQuery>,
) -> ApiResult<Json<DashboardPage>> {
    let time_range = query.time_range()?;
    let token = session_token(&state, &session).await?;

    match build_dashboard(state.api.as_ref(), &token, time_range, &state.clusterer).await {
        Ok(page) => Ok(Json(page)),
        Err(DashboardError::Unauthenticated(reason)) => {
            tracing::info!(session = %session.id, reason = %reason, "Spotify rejected session token");
            state.sessions.remove(&session.id).await;
            Err(ApiError::Unauthorized("Spotify session expired, log in again".to_string()))
        }
    }
}

/// GET /api/me
pub async fn get_me(session: SessionContext) -> Json<UserProfile> {
    Json(session.user)
}
