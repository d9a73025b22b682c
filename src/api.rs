//! HTTP API for the admin dashboard

mod handlers;
mod session;
mod types;

pub use handlers::create_router;
pub use session::SessionStore;

use crate::config::{ActiveEvent, AdminCredentials};
use crate::db::{Database, DbError};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;
use types::ErrorResponse;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub active_event: Arc<ActiveEvent>,
    pub sessions: Arc<SessionStore>,
    pub admin: Arc<AdminCredentials>,
}

impl AppState {
    pub fn new(db: Database, active_event: Arc<ActiveEvent>, admin: AdminCredentials) -> Self {
        Self {
            db,
            active_event,
            sessions: Arc::new(SessionStore::new()),
            admin: Arc::new(admin),
        }
    }
}

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Internal(String),
}

impl From<DbError> for AppError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::EventNotFound(_) | DbError::RegistrantNotFound(_) => {
                AppError::NotFound(e.to_string())
            }
            other => {
                tracing::error!(error = %other, "Database error");
                AppError::Internal("Internal server error".to_string())
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// `Json` body extractor whose rejections use the API error format
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// `Path` extractor whose rejections use the API error format
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct PathParams<T>(pub T);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
