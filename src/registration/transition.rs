//! Pure stage transition function
//!
//! Given the same stage, context and input this always produces the same
//! result; the store write it may request is carried out by the tracker,
//! which feeds the outcome back in as a second input.

use super::{Effect, Reply, Stage, RESTART_COMMAND};
use crate::db::EventId;

/// The active event as seen by one incoming message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventContext {
    pub event_id: Option<EventId>,
    pub event_name: Option<String>,
}

impl EventContext {
    pub fn new(event_id: Option<EventId>, event_name: Option<String>) -> Self {
        Self {
            event_id,
            event_name,
        }
    }
}

/// How the store answered a registrant write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Duplicate,
    Failed,
}

/// Inputs that drive the stage machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Message { text: String },
    WriteOutcome(WriteOutcome),
}

impl Input {
    pub fn message(text: impl Into<String>) -> Self {
        Input::Message { text: text.into() }
    }
}

/// Result of a stage transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub stage: Stage,
    /// `None` while a requested write is still outstanding
    pub reply: Option<Reply>,
    pub effect: Effect,
}

impl Transition {
    fn new(stage: Stage, reply: Reply) -> Self {
        Self {
            stage,
            reply: Some(reply),
            effect: Effect::None,
        }
    }

    fn write(stage: Stage, name: String) -> Self {
        Self {
            stage,
            reply: None,
            effect: Effect::WriteRegistrant { name },
        }
    }
}

pub fn transition(stage: Stage, context: &EventContext, input: Input) -> Transition {
    match (stage, input) {
        (Stage::Started, Input::Message { .. }) => Transition::new(
            Stage::AwaitingName,
            Reply::Welcome {
                event_name: context.event_name.clone(),
            },
        ),

        (Stage::AwaitingName, Input::Message { text }) if text == RESTART_COMMAND => {
            Transition::new(Stage::AwaitingName, Reply::StillWaitingForName)
        }

        // Nothing to register against; keep waiting so a later message can
        // register once an event is active
        (Stage::AwaitingName, Input::Message { .. }) if context.event_id.is_none() => {
            Transition::new(Stage::AwaitingName, Reply::RegistrationClosed)
        }

        (Stage::AwaitingName, Input::Message { text }) => {
            Transition::write(Stage::AwaitingName, text)
        }

        (Stage::Completed, Input::Message { .. }) => {
            Transition::new(Stage::Completed, Reply::AlreadyRegistered)
        }

        // Outcomes may land after a racing task already completed the key, so
        // they never move the stage backwards.
        (_, Input::WriteOutcome(WriteOutcome::Written)) => {
            Transition::new(Stage::Completed, Reply::Registered)
        }
        (_, Input::WriteOutcome(WriteOutcome::Duplicate)) => {
            Transition::new(Stage::Completed, Reply::AlreadyRegistered)
        }
        (current, Input::WriteOutcome(WriteOutcome::Failed)) => {
            Transition::new(current, Reply::RetryLater)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_context() -> EventContext {
        EventContext::new(Some(1), Some("Spring Meetup".to_string()))
    }

    #[test]
    fn test_first_message_sends_welcome() {
        let result = transition(Stage::Started, &test_context(), Input::message("hello"));

        assert_eq!(result.stage, Stage::AwaitingName);
        assert_eq!(
            result.reply,
            Some(Reply::Welcome {
                event_name: Some("Spring Meetup".to_string())
            })
        );
        assert_eq!(result.effect, Effect::None);
    }

    #[test]
    fn test_first_message_can_be_restart_command() {
        let result = transition(
            Stage::Started,
            &test_context(),
            Input::message(RESTART_COMMAND),
        );
        assert_eq!(result.stage, Stage::AwaitingName);
    }

    #[test]
    fn test_restart_while_awaiting_name() {
        let result = transition(
            Stage::AwaitingName,
            &test_context(),
            Input::message(RESTART_COMMAND),
        );

        assert_eq!(result.stage, Stage::AwaitingName);
        assert_eq!(result.reply, Some(Reply::StillWaitingForName));
        assert!(!result.effect.is_write());
    }

    #[test]
    fn test_name_requests_write() {
        let result = transition(
            Stage::AwaitingName,
            &test_context(),
            Input::message("Ada Lovelace"),
        );

        assert_eq!(result.stage, Stage::AwaitingName);
        assert_eq!(result.reply, None);
        assert_eq!(
            result.effect,
            Effect::WriteRegistrant {
                name: "Ada Lovelace".to_string()
            }
        );
    }

    #[test]
    fn test_name_without_active_event() {
        let result = transition(
            Stage::AwaitingName,
            &EventContext::default(),
            Input::message("Ada Lovelace"),
        );

        assert_eq!(result.stage, Stage::AwaitingName);
        assert_eq!(result.reply, Some(Reply::RegistrationClosed));
        assert!(!result.effect.is_write());
    }

    #[test]
    fn test_write_outcomes() {
        let ctx = test_context();

        let written = transition(
            Stage::AwaitingName,
            &ctx,
            Input::WriteOutcome(WriteOutcome::Written),
        );
        assert_eq!(written.stage, Stage::Completed);
        assert_eq!(written.reply, Some(Reply::Registered));

        let duplicate = transition(
            Stage::AwaitingName,
            &ctx,
            Input::WriteOutcome(WriteOutcome::Duplicate),
        );
        assert_eq!(duplicate.stage, Stage::Completed);
        assert_eq!(duplicate.reply, Some(Reply::AlreadyRegistered));

        let failed = transition(
            Stage::AwaitingName,
            &ctx,
            Input::WriteOutcome(WriteOutcome::Failed),
        );
        assert_eq!(failed.stage, Stage::AwaitingName);
        assert_eq!(failed.reply, Some(Reply::RetryLater));
    }

    #[test]
    fn test_late_failure_does_not_demote_completed() {
        let result = transition(
            Stage::Completed,
            &test_context(),
            Input::WriteOutcome(WriteOutcome::Failed),
        );
        assert_eq!(result.stage, Stage::Completed);
    }

    #[test]
    fn test_completed_is_terminal() {
        for text in ["again", RESTART_COMMAND, ""] {
            let result = transition(Stage::Completed, &test_context(), Input::message(text));
            assert_eq!(result.stage, Stage::Completed);
            assert_eq!(result.reply, Some(Reply::AlreadyRegistered));
            assert!(!result.effect.is_write());
        }
    }
}
