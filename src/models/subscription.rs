use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Node-scoped key a subscription record is cached under
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionKey {
    pub node_id: String,
    pub detail_type: String,
}

impl SubscriptionKey {
    pub fn new(node_id: impl Into<String>, detail_type: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            detail_type: detail_type.into(),
        }
    }
}

impl fmt::Display for SubscriptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.node_id, self.detail_type)
    }
}

/// Cached provisioning state for one event class in one region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub region: String,
    pub event_source: String,
    pub detail_type: String,
    /// Present once subscribed; absent while the rule is being provisioned
    pub subscription_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionRecord {
    pub fn pending(pattern: &SubscriptionPattern) -> Self {
        Self {
            region: pattern.region.clone(),
            event_source: pattern.source.clone(),
            detail_type: pattern.detail_type.clone(),
            subscription_id: None,
            updated_at: Utc::now(),
        }
    }

    pub fn subscribed(pattern: &SubscriptionPattern, subscription_id: impl Into<String>) -> Self {
        Self {
            subscription_id: Some(subscription_id.into()),
            ..Self::pending(pattern)
        }
    }

    pub fn is_pending(&self) -> bool {
        self.subscription_id.is_none()
    }

    /// Whether this record still describes `pattern`'s target
    pub fn matches(&self, pattern: &SubscriptionPattern) -> bool {
        self.region == pattern.region
            && self.event_source == pattern.source
            && self.detail_type == pattern.detail_type
    }
}

/// Event class a node subscribes to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionPattern {
    pub region: String,
    pub source: String,
    pub detail_type: String,
    /// Additional match on the event detail; `Value::Null` for none
    #[serde(default)]
    pub detail_filter: Value,
}

impl SubscriptionPattern {
    pub fn new(
        region: impl Into<String>,
        source: impl Into<String>,
        detail_type: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            source: source.into(),
            detail_type: detail_type.into(),
            detail_filter: Value::Null,
        }
    }

    pub fn with_detail_filter(mut self, filter: Value) -> Self {
        self.detail_filter = filter;
        self
    }
}

/// Result of ensuring a subscription exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionState {
    Subscribed(String),
    /// Rule requested but not available yet; a re-check is scheduled
    Pending,
}

impl SubscriptionState {
    pub fn subscription_id(&self) -> Option<&str> {
        match self {
            Self::Subscribed(id) => Some(id),
            Self::Pending => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}
