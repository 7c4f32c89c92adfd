use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::TrackerResult;
use crate::scheduler::{ScheduledAction, Scheduler};

#[derive(Debug, Clone, PartialEq)]
pub struct ArmedAction {
    pub action: ScheduledAction,
    pub after: Duration,
}

/// Scheduler that never fires on its own.
///
/// Keeps the same replace-by-name semantics as the real scheduler and records
/// every `schedule_call`, so tests can count arms and fire actions by hand.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    armed: Mutex<HashMap<String, ArmedAction>>,
    history: Mutex<Vec<ArmedAction>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn armed(&self, action_name: &str) -> Option<ArmedAction> {
        self.armed.lock().get(action_name).cloned()
    }

    pub fn is_armed(&self, action_name: &str) -> bool {
        self.armed.lock().contains_key(action_name)
    }

    pub fn armed_count(&self) -> usize {
        self.armed.lock().len()
    }

    /// Every `schedule_call` ever made, in order
    pub fn history(&self) -> Vec<ArmedAction> {
        self.history.lock().clone()
    }

    /// Number of `schedule_call`s for `action_name`
    pub fn schedule_count(&self, action_name: &str) -> usize {
        self.history
            .lock()
            .iter()
            .filter(|armed| armed.action.name() == action_name)
            .count()
    }

    /// Disarm `action_name` and hand back its action for the test to deliver
    pub fn take(&self, action_name: &str) -> Option<ScheduledAction> {
        self.armed
            .lock()
            .remove(action_name)
            .map(|armed| armed.action)
    }
}

#[async_trait]
impl Scheduler for ManualScheduler {
    async fn schedule_call(&self, action: ScheduledAction, after: Duration) -> TrackerResult<()> {
        let armed = ArmedAction { action, after };
        self.history.lock().push(armed.clone());
        self.armed.lock().insert(armed.action.name(), armed);
        Ok(())
    }

    async fn cancel_call(&self, action_name: &str) -> TrackerResult<bool> {
        Ok(self.armed.lock().remove(action_name).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rearm_replaces_and_history_counts() {
        let scheduler = ManualScheduler::new();
        let action = ScheduledAction::poll_status("ami-1");
        let name = action.name();

        scheduler
            .schedule_call(action.clone(), Duration::from_secs(300))
            .await
            .unwrap();
        scheduler
            .schedule_call(action.clone(), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(scheduler.armed_count(), 1);
        assert_eq!(scheduler.schedule_count(&name), 2);
        assert_eq!(scheduler.armed(&name).unwrap().after, Duration::from_secs(60));
        assert_eq!(scheduler.take(&name), Some(action));
        assert!(!scheduler.is_armed(&name));
    }
}
