use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::actions;
use crate::models::SubscriptionPattern;

/// Work the tracker asks the host to invoke later
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ScheduledAction {
    /// Check the vendor status of one operation
    PollStatus { correlation_key: String },
    /// Re-check whether the event-bus rule for `pattern` exists yet
    ProvisionCheck { pattern: SubscriptionPattern },
}

impl ScheduledAction {
    pub fn poll_status(correlation_key: impl Into<String>) -> Self {
        Self::PollStatus {
            correlation_key: correlation_key.into(),
        }
    }

    pub fn provision_check(pattern: SubscriptionPattern) -> Self {
        Self::ProvisionCheck { pattern }
    }

    /// Name the host schedules under; re-arming the same name replaces
    pub fn name(&self) -> String {
        match self {
            Self::PollStatus { correlation_key } => {
                format!("{}:{correlation_key}", actions::POLL_STATUS_PREFIX)
            }
            // One provisioning loop per event class, whatever the region
            Self::ProvisionCheck { pattern } => {
                format!("{}:{}", actions::PROVISION_CHECK_PREFIX, pattern.detail_type)
            }
        }
    }

    pub fn action_type(&self) -> &'static str {
        match self {
            Self::PollStatus { .. } => actions::POLL_STATUS_PREFIX,
            Self::ProvisionCheck { .. } => actions::PROVISION_CHECK_PREFIX,
        }
    }
}

impl fmt::Display for ScheduledAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_names() {
        assert_eq!(ScheduledAction::poll_status("ami-1").name(), "poll_status:ami-1");

        let east = SubscriptionPattern::new("us-east-1", "aws.ec2", "EC2 AMI State Change");
        let west = SubscriptionPattern::new("us-west-2", "aws.ec2", "EC2 AMI State Change");
        assert_eq!(
            ScheduledAction::provision_check(east).name(),
            ScheduledAction::provision_check(west).name()
        );
    }

    #[test]
    fn test_action_serde_shape() {
        let json = serde_json::to_value(ScheduledAction::poll_status("exec-1")).unwrap();
        assert_eq!(json["type"], "PollStatus");
        assert_eq!(json["data"]["correlation_key"], "exec-1");
    }
}
