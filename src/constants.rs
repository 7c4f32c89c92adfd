//! # System Constants
//!
//! Timing constants, emission channels and scheduled action names shared by
//! the tracker components.

/// Timing observed across the adapter catalog
pub mod timing {
    use std::time::Duration;

    /// Status poll interval while the vendor reports work in progress
    pub const POLL_INTERVAL: Duration = Duration::from_secs(5 * 60);

    /// First availability re-check after requesting rule creation
    pub const PROVISIONING_INITIAL_RECHECK: Duration = Duration::from_secs(5);

    /// Later availability re-checks
    pub const PROVISIONING_RETRY_INTERVAL: Duration = Duration::from_secs(10);
}

/// Output channels results are emitted on
pub mod channels {
    pub const PASSED: &str = "passed";
    pub const FAILED: &str = "failed";
}

/// Prefixes of scheduled action names handed to the host scheduler
pub mod actions {
    pub const POLL_STATUS_PREFIX: &str = "poll_status";
    pub const PROVISION_CHECK_PREFIX: &str = "provision_check";
}

/// Canonical vendor state strings accepted by the default translation
pub mod vendor_states {
    pub const SUCCEEDED: &str = "SUCCEEDED";
    pub const FAILED: &str = "FAILED";
    pub const CANCELED: &str = "CANCELED";
    pub const CANCELLED: &str = "CANCELLED";
    pub const STOPPED: &str = "STOPPED";

    /// Recorded when the status query itself failed, not the operation
    pub const STATUS_QUERY_FAILED: &str = "STATUS_QUERY_FAILED";
}

/// Payload field names shared by every operation kind
pub mod payload_fields {
    pub const DETAIL: &str = "detail";
    pub const STATUS: &str = "status";
    pub const STATE: &str = "state";
    pub const ERROR_MESSAGE: &str = "ErrorMessage";
}
