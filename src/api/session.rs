//! Admin sessions
//!
//! Tokens live in memory only; a restart logs everyone out.

use super::{AppError, AppState};
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::headers::Cookie;
use axum_extra::TypedHeader;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

pub const SESSION_COOKIE: &str = "session";
const SESSION_DAYS: i64 = 7;

/// Issued session tokens and their expiry
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh token
    pub async fn create(&self) -> String {
        let token = uuid::Uuid::new_v4().to_string();
        let expires_at = Utc::now() + Duration::days(SESSION_DAYS);

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, expiry| *expiry > Utc::now());
        sessions.insert(token.clone(), expires_at);
        token
    }

    pub async fn is_valid(&self, token: &str) -> bool {
        self.sessions
            .read()
            .await
            .get(token)
            .is_some_and(|expiry| *expiry > Utc::now())
    }

    pub async fn revoke(&self, token: &str) {
        self.sessions.write().await.remove(token);
    }
}

pub fn session_cookie(token: &str) -> String {
    format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_DAYS * 86_400
    )
}

pub fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Session token from the request cookies, if any
pub async fn session_token(parts: &mut Parts, state: &AppState) -> Option<String> {
    let TypedHeader(cookies) = TypedHeader::<Cookie>::from_request_parts(parts, state)
        .await
        .ok()?;
    cookies.get(SESSION_COOKIE).map(String::from)
}

/// Extractor that only succeeds for a logged-in admin
pub struct AdminSession {
    pub token: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match session_token(parts, state).await {
            Some(token) if state.sessions.is_valid(&token).await => Ok(Self { token }),
            _ => Err(AppError::Unauthorized("Login required".to_string())),
        }
    }
}
