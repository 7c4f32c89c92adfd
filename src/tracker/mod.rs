//! # Operation Tracking
//!
//! Completion of a long-running vendor operation is learned through two
//! independent channels that converge on the same per-operation record:
//!
//! ```text
//! launch ──► registry ──► poll tick ──► vendor status ──┐
//!                 ▲                                     ├─► try_apply_terminal ──► emit
//! push event ─────┴──► correlator ──────────────────────┘
//! ```
//!
//! Whichever channel applies the terminal transition first emits the result;
//! the other finds the record terminal and does nothing.
//!
//! - [`OperationTracker`]: composition root and the host-facing entry points
//! - [`EventCorrelator`]: push-notification path
//! - [`PollScheduler`]: status-poll fallback path
//! - [`ResultEmitter`]: the shared apply-then-emit step

pub mod event_correlator;
pub mod operation_tracker;
pub mod poll_scheduler;
pub mod result_emitter;

pub use event_correlator::{EventCorrelator, PushOutcome};
pub use operation_tracker::{OperationTracker, TrackerComponents};
pub use poll_scheduler::{PollOutcome, PollScheduler};
pub use result_emitter::{EmitOutcome, ResultEmitter};
