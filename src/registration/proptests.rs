//! Property-based tests for the registration stage machine

use super::*;
use proptest::prelude::*;

fn arb_stage() -> impl Strategy<Value = Stage> {
    prop_oneof![
        Just(Stage::Started),
        Just(Stage::AwaitingName),
        Just(Stage::Completed),
    ]
}

fn arb_outcome() -> impl Strategy<Value = WriteOutcome> {
    prop_oneof![
        Just(WriteOutcome::Written),
        Just(WriteOutcome::Duplicate),
        Just(WriteOutcome::Failed),
    ]
}

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(RESTART_COMMAND.to_string()),
        Just(String::new()),
        "[a-zA-Z ]{1,30}",
    ]
}

fn arb_input() -> impl Strategy<Value = Input> {
    prop_oneof![
        arb_text().prop_map(|text| Input::Message { text }),
        arb_outcome().prop_map(Input::WriteOutcome),
    ]
}

fn arb_context() -> impl Strategy<Value = EventContext> {
    (
        proptest::option::of(1i64..100),
        proptest::option::of("[a-zA-Z ]{1,20}"),
    )
        .prop_map(|(event_id, event_name)| EventContext::new(event_id, event_name))
}

proptest! {
    #[test]
    fn stage_never_moves_backwards(
        start in arb_stage(),
        context in arb_context(),
        inputs in proptest::collection::vec(arb_input(), 0..30),
    ) {
        let mut stage = start;
        for input in inputs {
            let result = transition(stage, &context, input);
            prop_assert!(result.stage >= stage);
            stage = result.stage;
        }
    }

    #[test]
    fn completed_never_requests_a_write(
        context in arb_context(),
        text in arb_text(),
    ) {
        let result = transition(Stage::Completed, &context, Input::Message { text });
        prop_assert_eq!(result.stage, Stage::Completed);
        prop_assert_eq!(result.effect, Effect::None);
        prop_assert_eq!(result.reply, Some(Reply::AlreadyRegistered));
    }

    #[test]
    fn restart_command_never_writes(stage in arb_stage(), context in arb_context()) {
        let result = transition(stage, &context, Input::message(RESTART_COMMAND));
        prop_assert!(!result.effect.is_write());
    }

    #[test]
    fn writes_only_requested_while_awaiting_name_with_event(
        stage in arb_stage(),
        context in arb_context(),
        input in arb_input(),
    ) {
        let result = transition(stage, &context, input);
        if result.effect.is_write() {
            prop_assert_eq!(stage, Stage::AwaitingName);
            prop_assert!(context.event_id.is_some());
            prop_assert!(result.reply.is_none());
        } else {
            prop_assert!(result.reply.is_some());
        }
    }

    #[test]
    fn write_request_carries_message_text(name in "[a-zA-Z][a-zA-Z ]{0,29}") {
        let context = EventContext::new(Some(1), None);
        let result = transition(Stage::AwaitingName, &context, Input::message(name.clone()));
        prop_assert_eq!(result.effect, Effect::WriteRegistrant { name });
    }
}
