//! Conversation stage types

use crate::db::EventId;

/// Where a chat is in the registration flow.
///
/// Variants are ordered; a key only ever moves to a later stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Nothing observed yet
    #[default]
    Started,
    /// Welcome sent, waiting for the registrant's name
    AwaitingName,
    /// Registration written or found already present
    Completed,
}

/// Stage map key: one chat against the event active when the message arrived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StageKey {
    pub chat_id: i64,
    pub event_id: Option<EventId>,
}

impl StageKey {
    pub fn new(chat_id: i64, event_id: Option<EventId>) -> Self {
        Self { chat_id, event_id }
    }
}
