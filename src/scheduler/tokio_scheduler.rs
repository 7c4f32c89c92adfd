//! In-process [`Scheduler`] backed by tokio timers.
//!
//! Fired actions are delivered on an `mpsc` channel; the receiving side is
//! normally drained by [`crate::tracker::OperationTracker::run`].

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{ScheduledAction, Scheduler};
use crate::error::TrackerResult;

#[derive(Debug)]
struct ArmedCall {
    generation: u64,
    handle: JoinHandle<()>,
}

#[derive(Debug)]
pub struct TokioScheduler {
    scheduler_id: Uuid,
    armed: Arc<DashMap<String, ArmedCall>>,
    generation: AtomicU64,
    sender: mpsc::Sender<ScheduledAction>,
}

impl TokioScheduler {
    /// Create a scheduler and the receiver its fired actions arrive on
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<ScheduledAction>) {
        let (sender, receiver) = mpsc::channel(capacity);
        let scheduler = Self {
            scheduler_id: Uuid::new_v4(),
            armed: Arc::new(DashMap::new()),
            generation: AtomicU64::new(0),
            sender,
        };
        (scheduler, receiver)
    }

    pub fn scheduler_id(&self) -> Uuid {
        self.scheduler_id
    }

    /// Number of actions currently armed
    pub fn armed_count(&self) -> usize {
        self.armed.len()
    }

    pub fn is_armed(&self, action_name: &str) -> bool {
        self.armed.contains_key(action_name)
    }

    /// Abort every armed action
    pub async fn shutdown(&self) {
        let names: Vec<String> = self.armed.iter().map(|entry| entry.key().clone()).collect();
        let handles: Vec<JoinHandle<()>> = names
            .iter()
            .filter_map(|name| self.armed.remove(name))
            .map(|(_, call)| {
                call.handle.abort();
                call.handle
            })
            .collect();

        // Aborted handles resolve with a cancellation error; nothing to inspect
        let _ = futures::future::join_all(handles).await;
        debug!(scheduler_id = %self.scheduler_id, "Scheduler shut down");
    }
}

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn schedule_call(&self, action: ScheduledAction, after: Duration) -> TrackerResult<()> {
        let name = action.name();
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let armed = Arc::clone(&self.armed);
        let sender = self.sender.clone();
        let task_name = name.clone();
        let scheduler_id = self.scheduler_id;
        let (slot_ready_tx, slot_ready_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            // Wait until the slot below holds this generation
            let _ = slot_ready_rx.await;
            tokio::time::sleep(after).await;

            // A newer schedule for the same name owns the slot now
            if armed
                .remove_if(&task_name, |_, call| call.generation == generation)
                .is_none()
            {
                return;
            }

            if let Err(e) = sender.send(action).await {
                warn!(
                    scheduler_id = %scheduler_id,
                    action = %task_name,
                    error = %e,
                    "Dropping fired action, receiver closed"
                );
            }
        });

        if let Some(previous) = self.armed.insert(name.clone(), ArmedCall { generation, handle }) {
            previous.handle.abort();
            debug!(
                scheduler_id = %self.scheduler_id,
                action = %name,
                "Replaced armed action"
            );
        }
        let _ = slot_ready_tx.send(());

        debug!(
            scheduler_id = %self.scheduler_id,
            action = %name,
            after = ?after,
            "⏰ Action armed"
        );
        Ok(())
    }

    async fn cancel_call(&self, action_name: &str) -> TrackerResult<bool> {
        match self.armed.remove(action_name) {
            Some((_, call)) => {
                call.handle.abort();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_action_fires_after_delay() {
        let (scheduler, mut receiver) = TokioScheduler::new(8);
        scheduler
            .schedule_call(ScheduledAction::poll_status("ami-1"), Duration::from_secs(300))
            .await
            .unwrap();
        assert!(scheduler.is_armed("poll_status:ami-1"));

        let fired = receiver.recv().await.unwrap();
        assert_eq!(fired, ScheduledAction::poll_status("ami-1"));
        assert!(!scheduler.is_armed("poll_status:ami-1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearming_replaces_previous_schedule() {
        let (scheduler, mut receiver) = TokioScheduler::new(8);
        scheduler
            .schedule_call(ScheduledAction::poll_status("exec-1"), Duration::from_secs(10))
            .await
            .unwrap();
        scheduler
            .schedule_call(ScheduledAction::poll_status("exec-1"), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(scheduler.armed_count(), 1);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(receiver.try_recv().is_err());

        let fired = receiver.recv().await.unwrap();
        assert_eq!(fired.name(), "poll_status:exec-1");
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_call() {
        let (scheduler, mut receiver) = TokioScheduler::new(8);
        scheduler
            .schedule_call(ScheduledAction::poll_status("exec-1"), Duration::from_secs(5))
            .await
            .unwrap();
        assert!(scheduler.cancel_call("poll_status:exec-1").await.unwrap());
        assert!(!scheduler.cancel_call("poll_status:exec-1").await.unwrap());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unbounded_delay_stays_armed_until_cancelled() {
        let (scheduler, mut receiver) = TokioScheduler::new(8);
        scheduler
            .schedule_call(ScheduledAction::poll_status("exec-far"), Duration::MAX)
            .await
            .unwrap();
        assert!(scheduler.is_armed("poll_status:exec-far"));
        assert!(receiver.try_recv().is_err());

        assert!(scheduler.cancel_call("poll_status:exec-far").await.unwrap());
        assert_eq!(scheduler.armed_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_disarms_everything() {
        let (scheduler, mut receiver) = TokioScheduler::new(8);
        for key in ["a", "b", "c"] {
            scheduler
                .schedule_call(ScheduledAction::poll_status(key), Duration::from_secs(5))
                .await
                .unwrap();
        }
        scheduler.shutdown().await;
        assert_eq!(scheduler.armed_count(), 0);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(receiver.try_recv().is_err());
    }
}
