//! # Execution Host
//!
//! The host runs the owning executions and receives their results. The tracker
//! only needs three things from it: emit a payload on a named output channel,
//! mark an execution failed, and report whether an execution already finished.

pub mod payload;
pub mod publisher;

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

use crate::error::TrackerResult;
use crate::models::ExecutionRef;

pub use payload::build_payload;
pub use publisher::{Emission, EmissionPublisher, PublishedEmission};

#[async_trait]
pub trait ExecutionHost: Send + Sync + fmt::Debug {
    /// Emit `payload` on `channel` for `owner`
    async fn emit(
        &self,
        owner: &ExecutionRef,
        channel: &str,
        payload_type: &str,
        payload: Value,
    ) -> TrackerResult<()>;

    /// Mark `owner` as failed with `message`
    async fn fail(&self, owner: &ExecutionRef, message: &str) -> TrackerResult<()>;

    /// Whether `owner` has already reached a finished state
    async fn is_finished(&self, owner: &ExecutionRef) -> TrackerResult<bool>;
}
