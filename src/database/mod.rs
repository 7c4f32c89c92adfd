//! # Database Operations
//!
//! PostgreSQL-backed implementations of the registry traits, for nodes whose
//! tracked operations must survive a process restart.
//!
//! - [`connection`] - Pool construction from configuration
//! - [`migrations`] - Embedded schema migrations
//! - [`operation_registry`] - [`PgOperationRegistry`], conditional `UPDATE` as the
//!   terminal compare-and-set
//! - [`subscription_store`] - [`PgSubscriptionStore`]

pub mod connection;
pub mod migrations;
pub mod operation_registry;
pub mod subscription_store;

pub use connection::DatabaseConnection;
pub use migrations::DatabaseMigrations;
pub use operation_registry::PgOperationRegistry;
pub use subscription_store::PgSubscriptionStore;
