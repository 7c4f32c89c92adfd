use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::error::{TrackerError, TrackerResult};
use crate::models::SubscriptionPattern;
use crate::provisioning::EventBus;

/// Event bus whose rule becomes available after a fixed number of
/// availability checks following the first creation request
#[derive(Debug, Default)]
pub struct MockEventBus {
    available_after_checks: usize,
    rule_requested: AtomicBool,
    checks_since_request: AtomicUsize,
    rule_exists_calls: AtomicUsize,
    request_rule_calls: AtomicUsize,
    subscribe_calls: AtomicUsize,
    fail_rule_exists: AtomicBool,
    fail_subscribe: AtomicBool,
}

impl MockEventBus {
    /// Rule already exists
    pub fn available() -> Self {
        Self::default()
    }

    /// Rule missing until `checks` availability queries after the request
    pub fn available_after(checks: usize) -> Self {
        Self {
            available_after_checks: checks.max(1),
            ..Self::default()
        }
    }

    /// Rule never appears
    pub fn never_available() -> Self {
        Self::available_after(usize::MAX)
    }

    pub fn fail_rule_exists(&self, fail: bool) {
        self.fail_rule_exists.store(fail, Ordering::SeqCst);
    }

    pub fn fail_subscribe(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::SeqCst);
    }

    pub fn rule_exists_calls(&self) -> usize {
        self.rule_exists_calls.load(Ordering::SeqCst)
    }

    pub fn request_rule_calls(&self) -> usize {
        self.request_rule_calls.load(Ordering::SeqCst)
    }

    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventBus for MockEventBus {
    async fn rule_exists(&self, pattern: &SubscriptionPattern) -> TrackerResult<bool> {
        self.rule_exists_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_rule_exists.load(Ordering::SeqCst) {
            return Err(TrackerError::event_bus(&pattern.region, "access denied"));
        }
        if self.available_after_checks == 0 {
            return Ok(true);
        }
        if !self.rule_requested.load(Ordering::SeqCst) {
            return Ok(false);
        }
        let checks = self.checks_since_request.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(checks >= self.available_after_checks)
    }

    async fn request_rule(&self, _pattern: &SubscriptionPattern) -> TrackerResult<()> {
        self.request_rule_calls.fetch_add(1, Ordering::SeqCst);
        self.rule_requested.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn subscribe(&self, pattern: &SubscriptionPattern) -> TrackerResult<String> {
        let call = self.subscribe_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(TrackerError::event_bus(&pattern.region, "subscribe rejected"));
        }
        Ok(format!("sub-{}-{call}", pattern.region))
    }
}
