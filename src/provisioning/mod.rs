//! # Push Subscription Provisioning
//!
//! A node receives push notifications only after an event-bus rule exists for
//! its event class and the node has subscribed to it. Rule creation is
//! requested once and then polled for availability on the delayed-task
//! scheduler until it appears.

pub mod provisioner;

use async_trait::async_trait;
use std::fmt;

use crate::error::TrackerResult;
use crate::models::SubscriptionPattern;

pub use provisioner::SubscriptionProvisioner;

/// Event-bus operations a node needs
#[async_trait]
pub trait EventBus: Send + Sync + fmt::Debug {
    /// Whether a rule routing `pattern` to this node exists yet
    async fn rule_exists(&self, pattern: &SubscriptionPattern) -> TrackerResult<bool>;

    /// Ask for the rule to be created; completes before the rule is usable
    async fn request_rule(&self, pattern: &SubscriptionPattern) -> TrackerResult<()>;

    /// Subscribe the node to an existing rule and return the subscription id
    async fn subscribe(&self, pattern: &SubscriptionPattern) -> TrackerResult<String>;
}
