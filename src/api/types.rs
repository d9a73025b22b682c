//! API request and response types

use crate::db::{Event, EventId, Registrant};
use serde::{Deserialize, Serialize};

/// Dashboard login form
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Request to create or update an event
#[derive(Debug, Deserialize)]
pub struct EventRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// `YYYY-MM-DDTHH:MM`, `YYYY-MM-DD HH:MM:SS` or RFC 3339.
    /// Optional on update, where it keeps the stored date.
    #[serde(default)]
    pub date: Option<String>,
}

/// Request to draw winners
#[derive(Debug, Deserialize)]
pub struct DrawRequest {
    pub count: usize,
}

/// Request to change a registrant's draw weight, echoed back on success
#[derive(Debug, Serialize, Deserialize)]
pub struct WeightRequest {
    pub n: i64,
}

/// Public event listing
#[derive(Debug, Serialize)]
pub struct EventListResponse {
    pub events: Vec<Event>,
    pub current_event_id: Option<EventId>,
    pub is_admin: bool,
}

/// Response with a single event
#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub event: Event,
}

/// Event with its registrants
#[derive(Debug, Serialize)]
pub struct EventDetailResponse {
    pub event: Event,
    pub registrants: Vec<Registrant>,
    pub is_current: bool,
}

/// Drawn winners in draw order
#[derive(Debug, Serialize)]
pub struct WinnersResponse {
    pub winners: Vec<Registrant>,
}

/// Response for simple success
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
