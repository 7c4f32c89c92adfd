//! # Delayed Tasks
//!
//! One reusable primitive for "call me back after a duration", used by both
//! the status poll loop and the subscription provisioning retry loop.
//!
//! Scheduling is keyed by action name and non-cumulative: arming an action
//! whose name is already armed replaces the earlier schedule, so at most one
//! future invocation per name is ever outstanding.

pub mod scheduled_action;
pub mod tokio_scheduler;

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

use crate::error::TrackerResult;

pub use scheduled_action::ScheduledAction;
pub use tokio_scheduler::TokioScheduler;

/// Host-side "schedule a call" contract
#[async_trait]
pub trait Scheduler: Send + Sync + fmt::Debug {
    /// Arm `action` to fire once after `after`, replacing any armed action
    /// with the same name
    async fn schedule_call(&self, action: ScheduledAction, after: Duration) -> TrackerResult<()>;

    /// Disarm an action by name; `false` if nothing was armed
    async fn cancel_call(&self, action_name: &str) -> TrackerResult<bool>;
}
