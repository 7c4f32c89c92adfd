//! # Tracker Configuration
//!
//! Typed configuration for the operation tracker. Values are layered by
//! [`ConfigManager`]: built-in defaults, then `tracker.toml`, then
//! `tracker.{environment}.toml`, then `TRACKER__*` environment variables.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use optracker_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let interval = manager.config().polling.interval();
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::timing;
use crate::event_system::DeploymentMode;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration for one tracker node
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Identifier of the adapter node owning subscriptions
    pub node_id: String,

    /// Which completion channels are active
    pub deployment_mode: DeploymentMode,

    /// Fallback status polling
    pub polling: PollingConfig,

    /// Event-bus rule provisioning and subscription
    pub provisioning: ProvisioningConfig,

    /// In-process delayed-task scheduler
    pub scheduler: SchedulerConfig,

    /// PostgreSQL persistence for the registries
    pub database: DatabaseConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            node_id: "optracker-node".to_string(),
            deployment_mode: DeploymentMode::default(),
            polling: PollingConfig::default(),
            provisioning: ProvisioningConfig::default(),
            scheduler: SchedulerConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PollingConfig {
    pub enabled: bool,
    /// Delay between status checks while the vendor reports work in progress
    pub interval_seconds: u64,
    /// Delay before the first status check after launch
    pub first_poll_delay_seconds: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: timing::POLL_INTERVAL.as_secs(),
            first_poll_delay_seconds: timing::POLL_INTERVAL.as_secs(),
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    pub fn first_poll_delay(&self) -> Duration {
        Duration::from_secs(self.first_poll_delay_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProvisioningConfig {
    pub enabled: bool,
    /// Delay before the first availability re-check after requesting a rule
    pub initial_recheck_seconds: u64,
    /// Delay between later availability re-checks
    pub retry_interval_seconds: u64,
    /// Region used when the caller does not name one
    pub default_region: Option<String>,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_recheck_seconds: timing::PROVISIONING_INITIAL_RECHECK.as_secs(),
            retry_interval_seconds: timing::PROVISIONING_RETRY_INTERVAL.as_secs(),
            default_region: None,
        }
    }
}

impl ProvisioningConfig {
    pub fn initial_recheck(&self) -> Duration {
        Duration::from_secs(self.initial_recheck_seconds)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Buffer size of the channel carrying fired actions to the tracker
    pub action_channel_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            action_channel_capacity: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URL; falls back to `DATABASE_URL`
    pub url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            acquire_timeout_seconds: 5,
        }
    }
}

impl DatabaseConfig {
    pub fn resolved_url(&self) -> Option<String> {
        self.url
            .clone()
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .filter(|url| !url.trim().is_empty())
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds)
    }
}

impl TrackerConfig {
    /// Reject values that would make the tracker spin or stall
    pub fn validate(&self) -> ConfigResult<()> {
        if self.node_id.trim().is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "node_id",
                "tracker",
            ));
        }

        if self.polling.enabled && self.polling.interval_seconds == 0 {
            return Err(ConfigurationError::invalid_value(
                "polling.interval_seconds",
                "0",
                "polling interval must be at least one second",
            ));
        }

        if self.provisioning.enabled {
            if self.provisioning.initial_recheck_seconds == 0 {
                return Err(ConfigurationError::invalid_value(
                    "provisioning.initial_recheck_seconds",
                    "0",
                    "initial re-check delay must be at least one second",
                ));
            }
            if self.provisioning.retry_interval_seconds == 0 {
                return Err(ConfigurationError::invalid_value(
                    "provisioning.retry_interval_seconds",
                    "0",
                    "retry interval must be at least one second",
                ));
            }
        }

        if self.scheduler.action_channel_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "scheduler.action_channel_capacity",
                "0",
                "channel capacity must be positive",
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigurationError::invalid_value(
                "database.max_connections",
                "0",
                "pool needs at least one connection",
            ));
        }

        if let Some(region) = &self.provisioning.default_region {
            if region.trim().is_empty() {
                return Err(ConfigurationError::invalid_value(
                    "provisioning.default_region",
                    region,
                    "region must not be blank when set",
                ));
            }
        }

        Ok(())
    }

    /// Polling is active only when both the mode and the section allow it
    pub fn polling_active(&self) -> bool {
        self.polling.enabled && self.deployment_mode.has_polling()
    }

    /// Push delivery is active only when both the mode and the section allow it
    pub fn push_active(&self) -> bool {
        self.provisioning.enabled && self.deployment_mode.has_event_driven()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_observed_timing() {
        let config = TrackerConfig::default();
        assert_eq!(config.polling.interval(), Duration::from_secs(300));
        assert_eq!(config.provisioning.initial_recheck(), Duration::from_secs(5));
        assert_eq!(config.provisioning.retry_interval(), Duration::from_secs(10));
        assert_eq!(config.deployment_mode, DeploymentMode::Hybrid);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let mut config = TrackerConfig::default();
        config.polling.interval_seconds = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("polling.interval_seconds"));

        config.polling.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_node_id_rejected() {
        let config = TrackerConfig {
            node_id: "  ".to_string(),
            ..TrackerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::MissingRequiredField { .. })
        ));
    }

    #[test]
    fn test_channel_activity_follows_deployment_mode() {
        let mut config = TrackerConfig::default();
        assert!(config.polling_active());
        assert!(config.push_active());

        config.deployment_mode = DeploymentMode::PollingOnly;
        assert!(config.polling_active());
        assert!(!config.push_active());

        config.deployment_mode = DeploymentMode::EventDrivenOnly;
        assert!(!config.polling_active());
        assert!(config.push_active());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: TrackerConfig = serde_json::from_value(serde_json::json!({
            "node_id": "image-baker",
            "polling": { "interval_seconds": 60 }
        }))
        .unwrap();
        assert_eq!(config.node_id, "image-baker");
        assert_eq!(config.polling.interval_seconds, 60);
        assert!(config.polling.enabled);
        assert_eq!(config.provisioning.retry_interval_seconds, 10);
    }
}
