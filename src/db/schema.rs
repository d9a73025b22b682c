//! Database schema and types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of an event row
pub type EventId = i64;

/// SQL schema for initialization
pub const SCHEMA: &str = r"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT,
    date TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_events_date ON events(date DESC);

CREATE TABLE IF NOT EXISTS registrants (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    account_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    handle TEXT,
    event_id INTEGER NOT NULL,
    n INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,

    FOREIGN KEY (event_id) REFERENCES events(id) ON DELETE CASCADE
);

CREATE UNIQUE INDEX IF NOT EXISTS unique_account_event ON registrants(account_id, event_id);
CREATE INDEX IF NOT EXISTS idx_registrants_event ON registrants(event_id, id);
";

/// Event record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Registrant record
///
/// `n` is the admin-editable repeat weight: the registrant counts as `n`
/// entries in a draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registrant {
    pub id: i64,
    pub account_id: i64,
    pub name: String,
    pub handle: Option<String>,
    pub event_id: EventId,
    pub n: i64,
    pub created_at: DateTime<Utc>,
}

/// Largest repeat weight a registrant can hold
pub const MAX_WEIGHT: i64 = 1_000_000;

impl Registrant {
    /// Weight used by the draw, clamped to `1..=MAX_WEIGHT`.
    pub fn draw_weight(&self) -> u64 {
        self.n.clamp(1, MAX_WEIGHT).unsigned_abs()
    }
}

/// Fields supplied by the chat transport when registering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRegistrant {
    pub account_id: i64,
    pub name: String,
    pub handle: Option<String>,
    pub event_id: EventId,
}
