#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Operation Tracker Core
//!
//! Vendor-agnostic tracking of long-running external operations: image bakes,
//! pipeline runs, container tasks, anything started on a third-party system
//! that finishes asynchronously.
//!
//! ## Overview
//!
//! Completion is learned through two independent, unreliable channels:
//!
//! - **Push**: an event-bus subscription the tracker provisions on demand,
//!   retrying until the rule exists
//! - **Poll**: a fixed-interval status query used as the fallback when push
//!   is slow, misconfigured or not provisioned yet
//!
//! Whichever channel first observes a terminal outcome wins. The registry's
//! atomic `try_apply_terminal` is the only synchronization point; the losing
//! channel finds the record terminal and becomes a silent no-op, so every
//! operation produces exactly one result.
//!
//! ## Module Organization
//!
//! - [`tracker`] - Composition root, push correlator and poll scheduler
//! - [`registry`] - Operation and subscription store traits, in-memory stores
//! - [`database`] - PostgreSQL-backed stores (feature `postgres`)
//! - [`provisioning`] - Event-bus rule provisioning and subscription
//! - [`scheduler`] - Delayed-task primitive for poll ticks and re-checks
//! - [`vendors`] - Adapter capability set and built-in operation kinds
//! - [`host`] - Result emission to the owning execution
//! - [`models`] - Operation, push event and subscription types
//! - [`state_machine`] - Operation status and transition rules
//! - [`event_system`] - Deployment modes and runtime statistics
//! - [`config`] - Layered configuration
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use optracker_core::config::TrackerConfig;
//! use optracker_core::host::EmissionPublisher;
//! use optracker_core::models::ExecutionRef;
//! use optracker_core::provisioning::EventBus;
//! use optracker_core::registry::{InMemoryOperationRegistry, InMemorySubscriptionStore};
//! use optracker_core::scheduler::TokioScheduler;
//! use optracker_core::tracker::{OperationTracker, TrackerComponents};
//! use optracker_core::vendors::{ImageKind, VendorAdapter, VendorClient};
//!
//! # async fn example(
//! #     client: Arc<dyn VendorClient>,
//! #     event_bus: Arc<dyn EventBus>,
//! # ) -> optracker_core::TrackerResult<()> {
//! let config = TrackerConfig::default();
//! let (scheduler, actions) = TokioScheduler::new(config.scheduler.action_channel_capacity);
//!
//! let tracker = Arc::new(OperationTracker::new(
//!     config,
//!     TrackerComponents {
//!         adapter: VendorAdapter::new(Arc::new(ImageKind), client),
//!         registry: Arc::new(InMemoryOperationRegistry::new()),
//!         subscriptions: Arc::new(InMemorySubscriptionStore::new()),
//!         host: Arc::new(EmissionPublisher::default()),
//!         scheduler: Arc::new(scheduler),
//!         event_bus,
//!     },
//! )?);
//!
//! tokio::spawn(tracker.clone().run(actions));
//! tracker
//!     .launch_in_region("ami-0abc", ExecutionRef::new("exec-1"), Some("us-east-1"))
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # All tests
//! ```

pub mod config;
pub mod constants;
#[cfg(feature = "postgres")]
pub mod database;
pub mod error;
pub mod event_system;
pub mod host;
pub mod logging;
pub mod models;
pub mod provisioning;
pub mod registry;
pub mod scheduler;
pub mod state_machine;
pub mod test_helpers;
pub mod tracker;
pub mod vendors;

pub use config::{ConfigManager, TrackerConfig};
pub use error::{TrackerError, TrackerResult};
pub use event_system::{DeploymentMode, TrackerStatsSnapshot};
pub use host::{EmissionPublisher, ExecutionHost};
pub use models::{ExecutionRef, Operation, PushEvent};
pub use provisioning::EventBus;
pub use registry::{OperationRegistry, SubscriptionStore};
pub use scheduler::{ScheduledAction, Scheduler, TokioScheduler};
pub use state_machine::{OperationStatus, TerminalStatus};
pub use tracker::{OperationTracker, PollOutcome, PushOutcome, TrackerComponents};
pub use vendors::{OperationKind, VendorAdapter, VendorClient};
