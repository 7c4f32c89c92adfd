//! # Registries
//!
//! Narrow state-store interfaces the tracker persists through, with in-process
//! implementations. PostgreSQL-backed implementations live in
//! [`crate::database`].
//!
//! - [`OperationRegistry`]: per-operation records keyed by correlation key;
//!   `try_apply_terminal` is the single synchronization point between the
//!   push and poll channels.
//! - [`SubscriptionStore`]: node-scoped subscription records.

pub mod operation_registry;
pub mod subscription_store;

pub use operation_registry::{InMemoryOperationRegistry, OperationRegistry};
pub use subscription_store::{InMemorySubscriptionStore, SubscriptionStore};
