//! # Vendor Adapters
//!
//! The tracker is generic over a small capability set. An adapter supplies:
//!
//! - an [`OperationKind`]: static description of the operation (payload key,
//!   identifier field, event class) plus the explicit allow-list translating
//!   vendor state strings into terminal statuses;
//! - a [`VendorClient`]: the calls that reach the vendor (start, status query,
//!   cancellation). Request signing and wire formats stay inside the client.
//!
//! Built-in kinds cover machine images, pipeline executions and container
//! tasks; clients are always supplied by the embedding adapter.

pub mod container_task;
pub mod image;
pub mod pipeline;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::constants::vendor_states;
use crate::error::TrackerResult;
use crate::models::push_event::error_message_from;
use crate::models::{EventDetail, Observation, PushEvent, SubscriptionPattern};
use crate::state_machine::TerminalStatus;

pub use container_task::ContainerTaskKind;
pub use image::ImageKind;
pub use pipeline::PipelineKind;

/// Authoritative status returned by a vendor status query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorStatus {
    pub identifier: String,
    pub status: String,
    pub raw_detail: Value,
}

impl VendorStatus {
    pub fn new(identifier: impl Into<String>, status: impl Into<String>, raw_detail: Value) -> Self {
        Self {
            identifier: identifier.into(),
            status: status.into(),
            raw_detail,
        }
    }
}

/// Static description of one kind of long-running operation
pub trait OperationKind: Send + Sync + fmt::Debug {
    /// Payload key the emitted summary is nested under, e.g. `image`
    fn kind(&self) -> &str;

    /// Summary field carrying the correlation key, e.g. `imageId`
    fn id_field(&self) -> &str;

    /// Payload type handed to the host with every emission
    fn payload_type(&self) -> &str;

    fn event_source(&self) -> &str;

    fn detail_type(&self) -> &str;

    /// Extra match on the event detail for the subscription
    fn detail_filter(&self) -> Value {
        Value::Null
    }

    /// Map a vendor state string to a terminal status; `None` for anything
    /// outside the allow-list, including every non-terminal state
    fn translate_terminal_state(&self, state: &str, detail: &Value) -> Option<TerminalStatus>;

    /// Human-readable name for the summary (`name` field), when the detail has one
    fn payload_name(&self, _detail: &Value) -> Option<String> {
        None
    }

    /// Vendor error message carried by a raw detail
    fn error_message(&self, detail: &Value) -> Option<String> {
        error_message_from(detail)
    }

    /// Pull identifier and state out of a push event of this kind
    fn observe(&self, event: &PushEvent) -> Option<Observation> {
        EventDetail::decode(&event.detail_type, &event.detail)
            .filter(|decoded| decoded.detail_type() == self.detail_type())
            .and_then(|decoded| decoded.observation())
    }

    fn subscription_pattern(&self, region: &str) -> SubscriptionPattern {
        SubscriptionPattern::new(region, self.event_source(), self.detail_type())
            .with_detail_filter(self.detail_filter())
    }
}

/// Calls that reach the vendor
#[async_trait]
pub trait VendorClient: Send + Sync + fmt::Debug {
    /// Start an operation and return its correlation key
    async fn start_operation(&self, request: &Value) -> TrackerResult<String>;

    async fn query_status(&self, correlation_key: &str) -> TrackerResult<VendorStatus>;

    /// Ask the vendor to stop an operation; advisory
    async fn cancel(&self, correlation_key: &str) -> TrackerResult<()>;
}

/// A kind paired with the client that talks to its vendor
#[derive(Debug, Clone)]
pub struct VendorAdapter {
    kind: Arc<dyn OperationKind>,
    client: Arc<dyn VendorClient>,
}

impl VendorAdapter {
    pub fn new(kind: Arc<dyn OperationKind>, client: Arc<dyn VendorClient>) -> Self {
        Self { kind, client }
    }

    pub fn kind(&self) -> &dyn OperationKind {
        self.kind.as_ref()
    }

    pub fn kind_arc(&self) -> Arc<dyn OperationKind> {
        Arc::clone(&self.kind)
    }

    pub fn client(&self) -> &dyn VendorClient {
        self.client.as_ref()
    }
}

/// Allow-list shared by the upper-case vendor state vocabularies.
///
/// Matching ignores ASCII case so status APIs answering `Succeeded` and events
/// carrying `SUCCEEDED` resolve the same way.
pub fn default_terminal_state(state: &str) -> Option<TerminalStatus> {
    let state = state.to_ascii_uppercase();
    match state.as_str() {
        vendor_states::SUCCEEDED => Some(TerminalStatus::Succeeded),
        vendor_states::FAILED => Some(TerminalStatus::Failed),
        vendor_states::CANCELED | vendor_states::CANCELLED | vendor_states::STOPPED => {
            Some(TerminalStatus::Stopped)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_allow_list() {
        assert_eq!(default_terminal_state("SUCCEEDED"), Some(TerminalStatus::Succeeded));
        assert_eq!(default_terminal_state("FAILED"), Some(TerminalStatus::Failed));
        assert_eq!(default_terminal_state("CANCELED"), Some(TerminalStatus::Stopped));
        assert_eq!(default_terminal_state("CANCELLED"), Some(TerminalStatus::Stopped));
        assert_eq!(default_terminal_state("STOPPED"), Some(TerminalStatus::Stopped));
        assert_eq!(default_terminal_state("Succeeded"), Some(TerminalStatus::Succeeded));
    }

    #[test]
    fn test_non_terminal_states_rejected() {
        for state in ["STARTED", "RESUMED", "PENDING", "InProgress", "STOPPING", ""] {
            assert_eq!(default_terminal_state(state), None, "state {state}");
        }
    }
}
