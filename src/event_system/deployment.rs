use serde::{Deserialize, Serialize};
use std::fmt;

/// Deployment mode for a tracker node
///
/// Deserialization fails if the configuration contains an unknown value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub enum DeploymentMode {
    /// Push notifications only
    EventDrivenOnly,
    /// Status polling only
    PollingOnly,
    /// Push notifications with polling fallback
    #[default]
    Hybrid,
    /// Tracker refuses new launches
    Disabled,
}

impl DeploymentMode {
    /// Check if this mode includes push delivery
    pub fn has_event_driven(&self) -> bool {
        matches!(
            self,
            DeploymentMode::Hybrid | DeploymentMode::EventDrivenOnly
        )
    }

    /// Check if this mode includes polling fallback
    pub fn has_polling(&self) -> bool {
        matches!(self, DeploymentMode::PollingOnly | DeploymentMode::Hybrid)
    }

    /// Check if this mode is event-driven only (no fallback)
    pub fn is_event_driven_only(&self) -> bool {
        matches!(self, DeploymentMode::EventDrivenOnly)
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, DeploymentMode::Disabled)
    }
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EventDrivenOnly => write!(f, "EventDrivenOnly"),
            Self::PollingOnly => write!(f, "PollingOnly"),
            Self::Hybrid => write!(f, "Hybrid"),
            Self::Disabled => write!(f, "Disabled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deployment_mode_properties() {
        assert!(DeploymentMode::Hybrid.has_event_driven());
        assert!(DeploymentMode::Hybrid.has_polling());
        assert!(!DeploymentMode::Hybrid.is_event_driven_only());

        assert!(!DeploymentMode::PollingOnly.has_event_driven());
        assert!(DeploymentMode::PollingOnly.has_polling());

        assert!(DeploymentMode::EventDrivenOnly.has_event_driven());
        assert!(!DeploymentMode::EventDrivenOnly.has_polling());
        assert!(DeploymentMode::EventDrivenOnly.is_event_driven_only());

        assert!(!DeploymentMode::Disabled.has_event_driven());
        assert!(!DeploymentMode::Disabled.has_polling());
        assert!(DeploymentMode::Disabled.is_disabled());
    }

    #[test]
    fn test_deployment_mode_serde() {
        let json = serde_json::to_string(&DeploymentMode::PollingOnly).unwrap();
        assert_eq!(json, "\"PollingOnly\"");
        assert!(serde_json::from_str::<DeploymentMode>("\"Sometimes\"").is_err());
    }
}
