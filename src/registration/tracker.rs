//! Per-chat registration tracker
//!
//! Owns the in-memory stage map. Reads and writes of the map happen under a
//! single mutex; the registrant write happens outside it, with the store's
//! unique constraint catching racing writers.

use super::{
    transition, Effect, EventContext, Input, RegistrantStore, Reply, Stage, StageKey, Transition,
    WriteError, WriteOutcome,
};
use crate::db::{EventId, NewRegistrant};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// One inbound chat message, already stripped of transport details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat_id: i64,
    pub account_id: i64,
    /// Sender's profile name in the chat client
    pub sender_name: String,
    pub handle: Option<String>,
    pub text: String,
}

/// What the tracker decided for one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advance {
    pub reply: Reply,
    /// `WriteRegistrant` when a store write was attempted
    pub effect: Effect,
    pub stage: Stage,
}

pub struct RegistrationTracker<S> {
    store: S,
    stages: Mutex<HashMap<StageKey, Stage>>,
}

impl<S: RegistrantStore> RegistrationTracker<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            stages: Mutex::new(HashMap::new()),
        }
    }

    fn stages(&self) -> MutexGuard<'_, HashMap<StageKey, Stage>> {
        self.stages.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current stage for a key (`Started` if never seen)
    #[allow(dead_code)] // Used in tests
    pub fn stage(&self, key: StageKey) -> Stage {
        self.stages().get(&key).copied().unwrap_or_default()
    }

    /// Apply `input` to the stored stage in one critical section
    fn step(&self, key: StageKey, context: &EventContext, input: Input) -> Transition {
        let mut stages = self.stages();
        let current = stages.get(&key).copied().unwrap_or_default();
        let result = transition(current, context, input);
        if result.stage > current {
            stages.insert(key, result.stage);
        }
        result
    }

    /// Advance the conversation for one incoming message.
    pub async fn advance(
        &self,
        message: &IncomingMessage,
        active_event: Option<EventId>,
    ) -> Advance {
        let context = self.event_context(active_event).await;
        let key = StageKey::new(message.chat_id, active_event);

        let result = self.step(key, &context, Input::message(message.text.as_str()));

        let (name, event_id) = match (&result.effect, active_event) {
            (Effect::WriteRegistrant { name }, Some(event_id)) => (name.clone(), event_id),
            _ => {
                return Advance {
                    reply: result.reply.unwrap_or(Reply::RetryLater),
                    effect: Effect::None,
                    stage: result.stage,
                }
            }
        };

        let new = NewRegistrant {
            account_id: message.account_id,
            name,
            handle: message.handle.clone(),
            event_id,
        };

        let outcome = match self.store.create_registrant(&new).await {
            Ok(registrant) => {
                tracing::info!(
                    registrant_id = registrant.id,
                    account_id = new.account_id,
                    sender = %message.sender_name,
                    event_id,
                    "Registrant created"
                );
                WriteOutcome::Written
            }
            Err(WriteError::AlreadyRegistered) => {
                tracing::info!(
                    account_id = new.account_id,
                    event_id,
                    "Account already registered"
                );
                WriteOutcome::Duplicate
            }
            Err(WriteError::Other(error)) => {
                tracing::error!(
                    account_id = new.account_id,
                    event_id,
                    error = %error,
                    "Failed to create registrant"
                );
                WriteOutcome::Failed
            }
        };

        let settled = self.step(key, &context, Input::WriteOutcome(outcome));
        Advance {
            reply: settled.reply.unwrap_or(Reply::RetryLater),
            effect: result.effect,
            stage: settled.stage,
        }
    }

    async fn event_context(&self, active_event: Option<EventId>) -> EventContext {
        let Some(event_id) = active_event else {
            return EventContext::default();
        };

        let event_name = match self.store.get_event(event_id).await {
            Ok(Some(event)) => Some(event.name),
            Ok(None) => {
                tracing::warn!(event_id, "Active event does not exist");
                None
            }
            Err(error) => {
                tracing::error!(event_id, error = %error, "Failed to load active event");
                None
            }
        };

        EventContext::new(Some(event_id), event_name)
    }
}
