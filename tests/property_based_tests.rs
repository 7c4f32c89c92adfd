use optracker_core::models::{ExecutionRef, NewOperation, ResolutionChannel, TerminalTransition};
use optracker_core::registry::{InMemoryOperationRegistry, OperationRegistry};
use optracker_core::state_machine::{
    decide_transition, OperationStatus, TerminalStatus, TransitionDecision,
};
use optracker_core::vendors::default_terminal_state;
use proptest::prelude::*;
use serde_json::json;

fn status_strategy() -> impl Strategy<Value = OperationStatus> {
    prop_oneof![
        Just(OperationStatus::Pending),
        Just(OperationStatus::InProgress),
        Just(OperationStatus::Succeeded),
        Just(OperationStatus::Failed),
        Just(OperationStatus::Stopped),
    ]
}

fn terminal_strategy() -> impl Strategy<Value = TerminalStatus> {
    prop_oneof![
        Just(TerminalStatus::Succeeded),
        Just(TerminalStatus::Failed),
        Just(TerminalStatus::Stopped),
    ]
}

fn channel_strategy() -> impl Strategy<Value = ResolutionChannel> {
    prop_oneof![Just(ResolutionChannel::Push), Just(ResolutionChannel::Poll)]
}

proptest! {
    /// Property: following the transition rule, status never leaves a terminal
    /// value and reaches at most one
    #[test]
    fn status_is_monotonic(targets in prop::collection::vec(status_strategy(), 0..32)) {
        let mut current = OperationStatus::Pending;
        let mut terminal_writes = 0;

        for target in targets {
            let before = current;
            if decide_transition(current, target) == TransitionDecision::Apply {
                current = target;
                if target.is_terminal() {
                    terminal_writes += 1;
                }
            }
            if before.is_terminal() {
                prop_assert_eq!(current, before);
            }
        }

        prop_assert!(terminal_writes <= 1);
    }

    /// Property: of any sequence of terminal attempts, exactly the first one
    /// is applied and stored
    #[test]
    fn first_terminal_attempt_wins(
        attempts in prop::collection::vec((terminal_strategy(), channel_strategy()), 1..12)
    ) {
        tokio_test::block_on(async {
            let registry = InMemoryOperationRegistry::new();
            registry
                .register(NewOperation::new("key-1", "pipeline", ExecutionRef::new("E1")))
                .await
                .unwrap();

            let mut applied = Vec::new();
            for (status, channel) in &attempts {
                let transition = TerminalTransition::new(*status, "STATE", json!({}), *channel);
                applied.push(registry.try_apply_terminal("key-1", &transition).await.unwrap());
            }

            prop_assert!(applied[0]);
            prop_assert_eq!(applied.iter().filter(|won| **won).count(), 1);

            let stored = registry.find_by_correlation_key("key-1").await.unwrap().unwrap();
            prop_assert_eq!(stored.status, OperationStatus::from(attempts[0].0));
            prop_assert_eq!(stored.resolved_by, Some(attempts[0].1));
            Ok(())
        })?;
    }

    /// Property: only the explicit allow-list translates to a terminal status
    #[test]
    fn unknown_states_never_translate(state in "[A-Za-z_]{0,12}") {
        let upper = state.to_ascii_uppercase();
        let listed = ["SUCCEEDED", "FAILED", "CANCELED", "CANCELLED", "STOPPED"]
            .contains(&upper.as_str());
        prop_assert_eq!(default_terminal_state(&state).is_some(), listed);
    }
}
