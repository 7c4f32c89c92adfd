use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::state_machine::{OperationStatus, TerminalStatus};

/// Opaque reference to the workflow execution waiting on an operation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionRef(String);

impl ExecutionRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExecutionRef {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Which completion channel applied the terminal transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionChannel {
    Push,
    Poll,
}

impl ResolutionChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Poll => "poll",
        }
    }
}

impl fmt::Display for ResolutionChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vendor payload captured by the winning transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationExtra {
    /// Vendor state string exactly as observed
    pub vendor_state: String,
    /// Raw vendor detail (push event detail or status response)
    pub detail: Value,
    pub error_message: Option<String>,
}

/// A tracked long-running operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub correlation_key: String,
    /// Operation kind name, e.g. `image` or `pipeline`
    pub kind: String,
    pub owner: ExecutionRef,
    pub status: OperationStatus,
    pub extra: Option<OperationExtra>,
    pub resolved_by: Option<ResolutionChannel>,
    pub registered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// New Operation for registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOperation {
    pub correlation_key: String,
    pub kind: String,
    pub owner: ExecutionRef,
}

impl NewOperation {
    pub fn new(
        correlation_key: impl Into<String>,
        kind: impl Into<String>,
        owner: ExecutionRef,
    ) -> Self {
        Self {
            correlation_key: correlation_key.into(),
            kind: kind.into(),
            owner,
        }
    }
}

impl Operation {
    /// Materialize a freshly registered operation
    pub fn from_new(new_operation: NewOperation) -> Self {
        let now = Utc::now();
        Self {
            correlation_key: new_operation.correlation_key,
            kind: new_operation.kind,
            owner: new_operation.owner,
            status: OperationStatus::Pending,
            extra: None,
            resolved_by: None,
            registered_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Write a terminal transition into this record. Callers must have
    /// checked the transition rule under the record's lock.
    pub(crate) fn apply_terminal(&mut self, transition: &TerminalTransition) {
        let now = Utc::now();
        self.status = transition.status.into();
        self.extra = Some(transition.extra());
        self.resolved_by = Some(transition.resolved_by);
        self.updated_at = now;
        self.completed_at = Some(now);
    }
}

/// A terminal outcome observed by one of the completion channels
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalTransition {
    pub status: TerminalStatus,
    pub vendor_state: String,
    pub detail: Value,
    pub error_message: Option<String>,
    pub resolved_by: ResolutionChannel,
}

impl TerminalTransition {
    pub fn new(
        status: TerminalStatus,
        vendor_state: impl Into<String>,
        detail: Value,
        resolved_by: ResolutionChannel,
    ) -> Self {
        Self {
            status,
            vendor_state: vendor_state.into(),
            detail,
            error_message: None,
            resolved_by,
        }
    }

    pub fn with_error_message(mut self, message: Option<String>) -> Self {
        self.error_message = message;
        self
    }

    pub fn extra(&self) -> OperationExtra {
        OperationExtra {
            vendor_state: self.vendor_state.clone(),
            detail: self.detail.clone(),
            error_message: self.error_message.clone(),
        }
    }
}
