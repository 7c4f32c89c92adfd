use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt;
use tracing::{debug, trace};

use crate::error::{TrackerError, TrackerResult};
use crate::models::{NewOperation, Operation, TerminalTransition};
use crate::state_machine::{decide_transition, OperationStatus, TransitionDecision};

/// Store of tracked operations keyed by correlation key
#[async_trait]
pub trait OperationRegistry: Send + Sync + fmt::Debug {
    /// Record a newly launched operation in `Pending`.
    ///
    /// Fails with [`TrackerError::DuplicateCorrelationKey`] while another
    /// operation with the same key is still in flight. A finished record with
    /// the same key is replaced.
    async fn register(&self, new_operation: NewOperation) -> TrackerResult<Operation>;

    /// Resolve a correlation key; `None` is a normal outcome
    async fn find_by_correlation_key(&self, correlation_key: &str)
        -> TrackerResult<Option<Operation>>;

    /// Atomically apply a terminal transition.
    ///
    /// Returns `true` only for the one caller that moved the record out of a
    /// non-terminal status. Unknown keys and already-terminal records return
    /// `false` without touching anything.
    async fn try_apply_terminal(
        &self,
        correlation_key: &str,
        transition: &TerminalTransition,
    ) -> TrackerResult<bool>;

    /// Advance `Pending` to `InProgress`; `false` if nothing changed
    async fn mark_in_progress(&self, correlation_key: &str) -> TrackerResult<bool>;

    /// Forget an operation once its execution no longer needs it
    async fn remove(&self, correlation_key: &str) -> TrackerResult<Option<Operation>>;
}

/// In-process registry; per-key atomicity comes from the map's entry locks
#[derive(Debug, Default)]
pub struct InMemoryOperationRegistry {
    operations: DashMap<String, Operation>,
}

impl InMemoryOperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

#[async_trait]
impl OperationRegistry for InMemoryOperationRegistry {
    async fn register(&self, new_operation: NewOperation) -> TrackerResult<Operation> {
        let operation = Operation::from_new(new_operation);

        match self.operations.entry(operation.correlation_key.clone()) {
            Entry::Occupied(mut existing) => {
                if !existing.get().is_terminal() {
                    return Err(TrackerError::DuplicateCorrelationKey(
                        operation.correlation_key,
                    ));
                }
                debug!(
                    correlation_key = %operation.correlation_key,
                    previous_status = %existing.get().status,
                    "Replacing finished operation with the same correlation key"
                );
                existing.insert(operation.clone());
            }
            Entry::Vacant(slot) => {
                slot.insert(operation.clone());
            }
        }

        Ok(operation)
    }

    async fn find_by_correlation_key(
        &self,
        correlation_key: &str,
    ) -> TrackerResult<Option<Operation>> {
        Ok(self
            .operations
            .get(correlation_key)
            .map(|entry| entry.value().clone()))
    }

    async fn try_apply_terminal(
        &self,
        correlation_key: &str,
        transition: &TerminalTransition,
    ) -> TrackerResult<bool> {
        // The RefMut holds the shard's write lock for the whole check-and-set
        let Some(mut operation) = self.operations.get_mut(correlation_key) else {
            trace!(correlation_key = %correlation_key, "No operation to resolve");
            return Ok(false);
        };

        match decide_transition(operation.status, transition.status.into()) {
            TransitionDecision::Apply => {
                operation.apply_terminal(transition);
                Ok(true)
            }
            TransitionDecision::AlreadyTerminal | TransitionDecision::NoOp => Ok(false),
        }
    }

    async fn mark_in_progress(&self, correlation_key: &str) -> TrackerResult<bool> {
        let Some(mut operation) = self.operations.get_mut(correlation_key) else {
            return Ok(false);
        };

        match decide_transition(operation.status, OperationStatus::InProgress) {
            TransitionDecision::Apply => {
                operation.status = OperationStatus::InProgress;
                operation.updated_at = Utc::now();
                Ok(true)
            }
            TransitionDecision::AlreadyTerminal | TransitionDecision::NoOp => Ok(false),
        }
    }

    async fn remove(&self, correlation_key: &str) -> TrackerResult<Option<Operation>> {
        Ok(self
            .operations
            .remove(correlation_key)
            .map(|(_, operation)| operation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExecutionRef, ResolutionChannel};
    use crate::state_machine::TerminalStatus;
    use serde_json::json;
    use std::sync::Arc;

    fn new_op(key: &str) -> NewOperation {
        NewOperation::new(key, "pipeline", ExecutionRef::new("wf-1"))
    }

    fn transition(status: TerminalStatus, channel: ResolutionChannel) -> TerminalTransition {
        TerminalTransition::new(status, status.to_string().to_uppercase(), json!({}), channel)
    }

    #[tokio::test]
    async fn test_register_and_find() {
        let registry = InMemoryOperationRegistry::new();
        registry.register(new_op("exec-1")).await.unwrap();

        let found = registry.find_by_correlation_key("exec-1").await.unwrap().unwrap();
        assert_eq!(found.status, OperationStatus::Pending);
        assert_eq!(found.owner, ExecutionRef::new("wf-1"));
        assert!(registry.find_by_correlation_key("exec-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_in_flight_key_rejected() {
        let registry = InMemoryOperationRegistry::new();
        registry.register(new_op("exec-1")).await.unwrap();
        let err = registry.register(new_op("exec-1")).await.unwrap_err();
        assert_eq!(err, TrackerError::DuplicateCorrelationKey("exec-1".into()));
    }

    #[tokio::test]
    async fn test_finished_key_can_be_reused() {
        let registry = InMemoryOperationRegistry::new();
        registry.register(new_op("exec-1")).await.unwrap();
        registry
            .try_apply_terminal(
                "exec-1",
                &transition(TerminalStatus::Succeeded, ResolutionChannel::Poll),
            )
            .await
            .unwrap();

        let fresh = registry.register(new_op("exec-1")).await.unwrap();
        assert_eq!(fresh.status, OperationStatus::Pending);
    }

    #[tokio::test]
    async fn test_first_terminal_wins() {
        let registry = InMemoryOperationRegistry::new();
        registry.register(new_op("exec-1")).await.unwrap();

        let first = registry
            .try_apply_terminal(
                "exec-1",
                &transition(TerminalStatus::Failed, ResolutionChannel::Push),
            )
            .await
            .unwrap();
        let second = registry
            .try_apply_terminal(
                "exec-1",
                &transition(TerminalStatus::Succeeded, ResolutionChannel::Poll),
            )
            .await
            .unwrap();

        assert!(first);
        assert!(!second);
        let stored = registry.find_by_correlation_key("exec-1").await.unwrap().unwrap();
        assert_eq!(stored.status, OperationStatus::Failed);
        assert_eq!(stored.resolved_by, Some(ResolutionChannel::Push));
    }

    #[tokio::test]
    async fn test_unknown_key_is_not_applied() {
        let registry = InMemoryOperationRegistry::new();
        let applied = registry
            .try_apply_terminal(
                "ghost",
                &transition(TerminalStatus::Succeeded, ResolutionChannel::Push),
            )
            .await
            .unwrap();
        assert!(!applied);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_mark_in_progress_never_overrides_terminal() {
        let registry = InMemoryOperationRegistry::new();
        registry.register(new_op("exec-1")).await.unwrap();
        assert!(registry.mark_in_progress("exec-1").await.unwrap());
        assert!(!registry.mark_in_progress("exec-1").await.unwrap());

        registry
            .try_apply_terminal(
                "exec-1",
                &transition(TerminalStatus::Stopped, ResolutionChannel::Poll),
            )
            .await
            .unwrap();
        assert!(!registry.mark_in_progress("exec-1").await.unwrap());
        let stored = registry.find_by_correlation_key("exec-1").await.unwrap().unwrap();
        assert_eq!(stored.status, OperationStatus::Stopped);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_terminal_transitions_have_one_winner() {
        let registry = Arc::new(InMemoryOperationRegistry::new());
        registry.register(new_op("exec-race")).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..32 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                let (status, channel) = if i % 2 == 0 {
                    (TerminalStatus::Succeeded, ResolutionChannel::Push)
                } else {
                    (TerminalStatus::Failed, ResolutionChannel::Poll)
                };
                registry
                    .try_apply_terminal("exec-race", &transition(status, channel))
                    .await
                    .unwrap()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_remove() {
        let registry = InMemoryOperationRegistry::new();
        registry.register(new_op("exec-1")).await.unwrap();
        assert!(registry.remove("exec-1").await.unwrap().is_some());
        assert!(registry.remove("exec-1").await.unwrap().is_none());
    }
}
