//! Error types for the operation tracker.
//!
//! Transient conditions (a rule that is not provisioned yet, a push event for
//! an operation this node never launched, a lost push/poll race) are not
//! errors and never surface here. Everything in [`TrackerError`] is either a
//! configuration problem or a real failure of a collaborator.

use thiserror::Error;

use crate::config::ConfigurationError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackerError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Vendor error during {operation} for {correlation_key}: {reason}")]
    VendorError {
        operation: String,
        correlation_key: String,
        reason: String,
    },
    #[error("Event bus error in {region}: {reason}")]
    EventBusError { region: String, reason: String },
    #[error("Registry error: {0}")]
    RegistryError(String),
    #[error("Scheduler error for action {action}: {reason}")]
    SchedulerError { action: String, reason: String },
    #[error("Host error: {0}")]
    HostError(String),
    #[error("Correlation key {0} is already registered")]
    DuplicateCorrelationKey(String),
    #[error("Tracker {0} is disabled by configuration")]
    Disabled(String),
}

impl TrackerError {
    pub fn vendor(
        operation: impl Into<String>,
        correlation_key: impl Into<String>,
        reason: impl std::fmt::Display,
    ) -> Self {
        Self::VendorError {
            operation: operation.into(),
            correlation_key: correlation_key.into(),
            reason: reason.to_string(),
        }
    }

    pub fn event_bus(region: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::EventBusError {
            region: region.into(),
            reason: reason.to_string(),
        }
    }

    pub fn scheduler(action: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::SchedulerError {
            action: action.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error came from configuration and must never be retried
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::ConfigurationError(_) | Self::ValidationError(_) | Self::Disabled(_)
        )
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(error: serde_json::Error) -> Self {
        TrackerError::ValidationError(format!("JSON serialization error: {error}"))
    }
}

impl From<ConfigurationError> for TrackerError {
    fn from(error: ConfigurationError) -> Self {
        TrackerError::ConfigurationError(error.to_string())
    }
}

impl From<::config::ConfigError> for TrackerError {
    fn from(error: ::config::ConfigError) -> Self {
        TrackerError::ConfigurationError(error.to_string())
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for TrackerError {
    fn from(err: sqlx::Error) -> Self {
        TrackerError::RegistryError(err.to_string())
    }
}

pub type TrackerResult<T> = std::result::Result<T, TrackerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_error_display() {
        let err = TrackerError::vendor("query_status", "exec-1", "throttled");
        assert_eq!(
            err.to_string(),
            "Vendor error during query_status for exec-1: throttled"
        );
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_configuration_classification() {
        assert!(TrackerError::ValidationError("missing region".into()).is_configuration());
        assert!(TrackerError::Disabled("image".into()).is_configuration());
        assert!(!TrackerError::RegistryError("down".into()).is_configuration());
    }

    #[test]
    fn test_from_serde_json_error() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: TrackerError = parse_err.into();
        assert!(matches!(err, TrackerError::ValidationError(_)));
    }
}
