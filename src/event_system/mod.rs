//! # Completion Channel Modes and Statistics
//!
//! Deployment modes decide which completion channels a tracker runs:
//!
//! - **PollingOnly**: status polling only, no event-bus subscription
//! - **Hybrid**: push notifications with polling fallback (default)
//! - **EventDrivenOnly**: push notifications only
//!
//! Polling in Hybrid mode is a permanent reliability feature, not a migration
//! aid: push delivery can be late, misrouted or not provisioned yet.

pub mod deployment;
pub mod statistics;

pub use deployment::DeploymentMode;
pub use statistics::{TrackerStats, TrackerStatsSnapshot};
