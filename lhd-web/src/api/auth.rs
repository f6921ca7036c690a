//! Login, OAuth callback and logout
//!
//! A successful login always ends with a server-side session and the
//! `lhd_session` cookie, whether the token came from the cache or from a
//! fresh authorization code. These routes are browser navigations, so a
//! failure renders the login page with the reason instead of a JSON body.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use super::ui::login_page;
use crate::auth::{AuthError, CallbackQuery, TokenInfo};
use crate::error::{ApiError, ApiResult};
use crate::session::{
    build_cookie, removal_cookie, session_id, OAUTH_STATE_COOKIE, SESSION_COOKIE,
};
use crate::spotify::SpotifyError;
use crate::AppState;

/// Look up the token's owner and open a session for them
///
/// A session named by the incoming cookie is replaced, not kept alongside.
async fn start_session(state: &AppState, jar: CookieJar, token: TokenInfo) -> ApiResult<Response> {
    let user = state.api.current_user(&token.access_token).await?;
    if let Some(previous) = session_id(&jar) {
        state.sessions.remove(&previous).await;
    }
    let id = state.sessions.create(token, user).await;
    let jar = jar.add(build_cookie(SESSION_COOKIE, id.to_string()));
    Ok((jar, Redirect::to("/")).into_response())
}

/// Login page carrying the failure, with the error's status code
fn login_failed(jar: CookieJar, error: ApiError) -> Response {
    let status = error.status();
    tracing::warn!(error = %error, status = %status, "Login failed");
    let message = format!("Login failed: {}. Please try again.", error);
    (status, jar, login_page(Some(&message))).into_response()
}

/// GET /login
///
/// Reuses a cached token when there is one; otherwise sends the browser to
/// the Spotify consent page with a fresh `state` value.
pub async fn login(State(state): State<AppState>, jar: CookieJar) -> Response {
    match begin_login(&state, jar.clone()).await {
        Ok(response) => response,
        Err(e) => login_failed(jar, e),
    }
}

async fn begin_login(state: &AppState, jar: CookieJar) -> ApiResult<Response> {
    if let Some(token) = state.auth.get_cached_token().await? {
        match start_session(state, jar.clone(), token).await {
            Ok(response) => {
                tracing::info!("Logged in with cached token");
                return Ok(response);
            }
            Err(ApiError::Spotify(SpotifyError::Unauthorized(_))) => {
                tracing::info!("Cached token rejected; starting authorization");
                state.auth.clear_cache()?;
            }
            Err(e) => return Err(e),
        }
    }

    let oauth_state = Uuid::new_v4().to_string();
    let url = state.auth.get_authorize_url(&oauth_state)?;
    tracing::debug!("Redirecting to Spotify authorization");

    let jar = jar.add(build_cookie(OAUTH_STATE_COOKIE, oauth_state));
    Ok((jar, Redirect::to(&url)).into_response())
}

/// GET /callback
///
/// OAuth redirect target. A refused consent renders the login page with
/// the provider's reason.
pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let expected_state = jar.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.remove(removal_cookie(OAUTH_STATE_COOKIE));

    let code = match state.auth.get_auth_response(&query, expected_state.as_deref()) {
        Ok(code) => code,
        Err(AuthError::Denied(reason)) => {
            tracing::info!(reason = %reason, "Authorization denied");
            let message = format!("Spotify authorization was not granted ({}).", reason);
            return (jar, login_page(Some(&message))).into_response();
        }
        Err(e) => return login_failed(jar, e.into()),
    };

    let result = match state.auth.get_access_token(&code).await {
        Ok(token) => start_session(&state, jar.clone(), token).await,
        Err(e) => Err(e.into()),
    };
    result.unwrap_or_else(|e| login_failed(jar, e))
}

/// GET /logout
///
/// Drops the session and the cached token so the next login asks again.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> ApiResult<Response> {
    if let Some(id) = session_id(&jar) {
        state.sessions.remove(&id).await;
    }
    state.auth.clear_cache()?;

    let jar = jar.remove(removal_cookie(SESSION_COOKIE));
    Ok((jar, Redirect::to("/")).into_response())
}
