//! HTTP request handlers

use super::session::{expired_session_cookie, session_cookie, AdminSession};
use super::types::{
    DrawRequest, EventDetailResponse, EventListResponse, EventRequest, EventResponse,
    LoginRequest, SuccessResponse, WeightRequest, WinnersResponse,
};
use super::{AppError, AppState, JsonBody, PathParams};
use crate::db::{EventId, MAX_WEIGHT};
use crate::draw::draw_winners;
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDateTime, Utc};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        // Events (listing is public, everything else needs an admin session)
        .route("/api/events", get(list_events).post(create_event))
        .route(
            "/api/events/:id",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route("/api/events/:id/current", post(set_current_event))
        .route("/api/events/:id/winners", post(select_winners))
        .route(
            "/api/events/:event_id/registrants/:registrant_id",
            patch(update_registrant_weight).delete(delete_registrant),
        )
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Session
// ============================================================

async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Response, AppError> {
    if !state.admin.matches(&req.username, &req.password) {
        tracing::warn!(username = %req.username, "Rejected admin login");
        return Err(AppError::Unauthorized(
            "Invalid username or password".to_string(),
        ));
    }

    let token = state.sessions.create().await;
    tracing::info!("Admin logged in");

    Ok((
        [(header::SET_COOKIE, session_cookie(&token))],
        Json(SuccessResponse { success: true }),
    )
        .into_response())
}

async fn logout(State(state): State<AppState>, session: Option<AdminSession>) -> Response {
    if let Some(session) = session {
        state.sessions.revoke(&session.token).await;
    }

    (
        [(header::SET_COOKIE, expired_session_cookie())],
        Json(SuccessResponse { success: true }),
    )
        .into_response()
}

// ============================================================
// Events
// ============================================================

async fn list_events(
    State(state): State<AppState>,
    session: Option<AdminSession>,
) -> Result<Json<EventListResponse>, AppError> {
    let events = state.db.list_events()?;

    Ok(Json(EventListResponse {
        events,
        current_event_id: state.active_event.get(),
        is_admin: session.is_some(),
    }))
}

async fn create_event(
    State(state): State<AppState>,
    _admin: AdminSession,
    JsonBody(req): JsonBody<EventRequest>,
) -> Result<Json<EventResponse>, AppError> {
    let name = required_name(&req)?;
    let date = match req.date.as_deref() {
        Some(raw) => parse_event_date(raw)?,
        None => return Err(AppError::BadRequest("Event date is required".to_string())),
    };

    let event = state
        .db
        .create_event(name, description(&req), date)?;
    tracing::info!(event_id = event.id, name = %event.name, "Event created");

    Ok(Json(EventResponse { event }))
}

async fn get_event(
    State(state): State<AppState>,
    _admin: AdminSession,
    PathParams(id): PathParams<EventId>,
) -> Result<Json<EventDetailResponse>, AppError> {
    let event = state.db.get_event(id)?;
    let registrants = state.db.list_registrants(id)?;

    Ok(Json(EventDetailResponse {
        event,
        registrants,
        is_current: state.active_event.get() == Some(id),
    }))
}

async fn update_event(
    State(state): State<AppState>,
    _admin: AdminSession,
    PathParams(id): PathParams<EventId>,
    JsonBody(req): JsonBody<EventRequest>,
) -> Result<Json<EventResponse>, AppError> {
    let name = required_name(&req)?;
    let date = match req.date.as_deref().filter(|d| !d.is_empty()) {
        Some(raw) => parse_event_date(raw)?,
        None => state.db.get_event(id)?.date,
    };

    let event = state
        .db
        .update_event(id, name, description(&req), date)?;

    Ok(Json(EventResponse { event }))
}

async fn delete_event(
    State(state): State<AppState>,
    _admin: AdminSession,
    PathParams(id): PathParams<EventId>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.delete_event(id)?;
    tracing::info!(event_id = id, "Event deleted");

    Ok(Json(SuccessResponse { success: true }))
}

async fn set_current_event(
    State(state): State<AppState>,
    _admin: AdminSession,
    PathParams(id): PathParams<EventId>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.get_event(id)?;
    state.active_event.set(id);

    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// Draw
// ============================================================

async fn select_winners(
    State(state): State<AppState>,
    _admin: AdminSession,
    PathParams(id): PathParams<EventId>,
    JsonBody(req): JsonBody<DrawRequest>,
) -> Result<Json<WinnersResponse>, AppError> {
    state.db.get_event(id)?;
    let roster = state.db.list_registrants(id)?;

    let winners = draw_winners(&roster, req.count);
    tracing::info!(
        event_id = id,
        requested = req.count,
        roster = roster.len(),
        drawn = winners.len(),
        "Winners drawn"
    );

    Ok(Json(WinnersResponse { winners }))
}

// ============================================================
// Registrants
// ============================================================

async fn update_registrant_weight(
    State(state): State<AppState>,
    _admin: AdminSession,
    PathParams((event_id, registrant_id)): PathParams<(EventId, i64)>,
    JsonBody(req): JsonBody<WeightRequest>,
) -> Result<Json<WeightRequest>, AppError> {
    if !(1..=MAX_WEIGHT).contains(&req.n) {
        return Err(AppError::BadRequest(format!(
            "Weight must be between 1 and {MAX_WEIGHT}"
        )));
    }

    state
        .db
        .update_registrant_weight(event_id, registrant_id, req.n)?;

    Ok(Json(req))
}

async fn delete_registrant(
    State(state): State<AppState>,
    _admin: AdminSession,
    PathParams((event_id, registrant_id)): PathParams<(EventId, i64)>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.delete_registrant(event_id, registrant_id)?;

    Ok(Json(SuccessResponse { success: true }))
}

async fn get_version() -> &'static str {
    concat!("giveaway-bot ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Form helpers
// ============================================================

fn required_name(req: &EventRequest) -> Result<&str, AppError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Event name is required".to_string()));
    }
    Ok(name)
}

fn description(req: &EventRequest) -> Option<&str> {
    req.description.as_deref().filter(|d| !d.is_empty())
}

/// Accepts the browser `datetime-local` format, a plain timestamp, or RFC 3339
fn parse_event_date(raw: &str) -> Result<DateTime<Utc>, AppError> {
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Ok(date.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| {
            tracing::warn!(input = %raw, "Failed to parse event date");
            AppError::BadRequest(
                "Invalid date format. Please use YYYY-MM-DDTHH:MM format.".to_string(),
            )
        })
}
