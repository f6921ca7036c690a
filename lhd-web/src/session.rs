//! Server-side sessions keyed by cookie
//!
//! The browser holds an opaque UUID in `lhd_session`; the token and user
//! profile stay on the server. Unknown, malformed or expired cookies count
//! as no session. Expired entries are pruned whenever a session is created.

use crate::auth::TokenInfo;
use crate::error::ApiError;
use crate::spotify::UserProfile;
use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "lhd_session";
pub const OAUTH_STATE_COOKIE: &str = "lhd_oauth_state";

/// Session lifetime counted from creation
pub const SESSION_TTL_HOURS: i64 = 24;

/// Authenticated user context
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub id: Uuid,
    pub token: TokenInfo,
    pub user: UserProfile,
    pub created_at: DateTime<Utc>,
}

impl SessionContext {
    pub fn is_expired_at(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.created_at >= ttl
    }
}

/// In-memory session map
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SessionContext>>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl(Duration::hours(SESSION_TTL_HOURS))
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Start a session and return its id
    pub async fn create(&self, token: TokenInfo, user: UserProfile) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let context = SessionContext {
            id,
            token,
            user,
            created_at: now,
        };
        tracing::info!(session = %id, user = %context.user.id, "Session created");

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, existing| !existing.is_expired_at(now, self.ttl));
        if sessions.len() < before {
            tracing::debug!(pruned = before - sessions.len(), "Expired sessions pruned");
        }
        sessions.insert(id, context);
        id
    }

    /// Live session by id; expired ones read as absent
    pub async fn get(&self, id: &Uuid) -> Option<SessionContext> {
        let now = Utc::now();
        self.sessions
            .read()
            .await
            .get(id)
            .filter(|context| !context.is_expired_at(now, self.ttl))
            .cloned()
    }

    /// Replace the token of an existing session (after a refresh)
    pub async fn update_token(&self, id: &Uuid, token: TokenInfo) {
        if let Some(context) = self.sessions.write().await.get_mut(id) {
            context.token = token;
        }
    }

    pub async fn remove(&self, id: &Uuid) -> Option<SessionContext> {
        let removed = self.sessions.write().await.remove(id);
        if removed.is_some() {
            tracing::info!(session = %id, "Session removed");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Session named by the request's cookie, if it exists
    pub async fn lookup(&self, jar: &CookieJar) -> Option<SessionContext> {
        let id = session_id(jar)?;
        self.get(&id).await
    }
}

/// Session id carried by the request's cookie, if well-formed
pub fn session_id(jar: &CookieJar) -> Option<Uuid> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

/// HTTP-only, lax cookie scoped to the whole site
pub fn build_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Cookie that deletes `name` in the browser
pub fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionContext
where
    SessionStore: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let store = SessionStore::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        match store.lookup(&jar).await {
            Some(context) => Ok(context),
            None => {
                tracing::debug!("Request without a valid session");
                Err(ApiError::Unauthorized("Not logged in".to_string()))
            }
        }
    }
}
