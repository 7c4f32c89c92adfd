use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::channels;

/// Operation status as seen by the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    /// Registered, vendor has not reported progress yet
    #[default]
    Pending,
    /// Vendor reported the operation as running
    InProgress,
    /// Operation completed successfully
    Succeeded,
    /// Operation failed on the vendor side
    Failed,
    /// Operation was cancelled or stopped before completing
    Stopped,
}

impl OperationStatus {
    /// Check if this is a terminal status (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Stopped)
    }

    /// Check if this is an active status (vendor is working)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::InProgress)
    }

    /// Terminal view of this status, if it is terminal
    pub fn as_terminal(&self) -> Option<TerminalStatus> {
        match self {
            Self::Succeeded => Some(TerminalStatus::Succeeded),
            Self::Failed => Some(TerminalStatus::Failed),
            Self::Stopped => Some(TerminalStatus::Stopped),
            Self::Pending | Self::InProgress => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OperationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "succeeded" => Ok(Self::Succeeded),
            "failed" => Ok(Self::Failed),
            "stopped" => Ok(Self::Stopped),
            _ => Err(format!("Invalid operation status: {s}")),
        }
    }
}

/// The three statuses an operation can finish in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalStatus {
    Succeeded,
    Failed,
    Stopped,
}

impl TerminalStatus {
    /// Emission channel for this outcome
    pub fn channel(&self) -> &'static str {
        match self {
            Self::Succeeded => channels::PASSED,
            Self::Failed | Self::Stopped => channels::FAILED,
        }
    }

    /// Failed outcomes fail the owning execution instead of emitting
    pub fn fails_execution(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

impl From<TerminalStatus> for OperationStatus {
    fn from(status: TerminalStatus) -> Self {
        match status {
            TerminalStatus::Succeeded => Self::Succeeded,
            TerminalStatus::Failed => Self::Failed,
            TerminalStatus::Stopped => Self::Stopped,
        }
    }
}

impl fmt::Display for TerminalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        OperationStatus::from(*self).fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_check() {
        assert!(OperationStatus::Succeeded.is_terminal());
        assert!(OperationStatus::Failed.is_terminal());
        assert!(OperationStatus::Stopped.is_terminal());
        assert!(!OperationStatus::Pending.is_terminal());
        assert!(!OperationStatus::InProgress.is_terminal());
    }

    #[test]
    fn test_status_string_conversion() {
        assert_eq!(OperationStatus::InProgress.to_string(), "in_progress");
        assert_eq!(
            "stopped".parse::<OperationStatus>().unwrap(),
            OperationStatus::Stopped
        );
        assert!("complete".parse::<OperationStatus>().is_err());
        assert_eq!(TerminalStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn test_terminal_round_trip() {
        for terminal in [
            TerminalStatus::Succeeded,
            TerminalStatus::Failed,
            TerminalStatus::Stopped,
        ] {
            assert_eq!(OperationStatus::from(terminal).as_terminal(), Some(terminal));
        }
        assert_eq!(OperationStatus::Pending.as_terminal(), None);
    }

    #[test]
    fn test_channels() {
        assert_eq!(TerminalStatus::Succeeded.channel(), "passed");
        assert_eq!(TerminalStatus::Stopped.channel(), "failed");
        assert!(TerminalStatus::Failed.fails_execution());
        assert!(!TerminalStatus::Stopped.fails_execution());
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&OperationStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}
