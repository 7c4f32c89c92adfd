use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::EventBus;
use crate::config::ProvisioningConfig;
use crate::error::TrackerResult;
use crate::event_system::TrackerStats;
use crate::logging::log_provisioning_event;
use crate::models::{SubscriptionKey, SubscriptionPattern, SubscriptionRecord, SubscriptionState};
use crate::registry::SubscriptionStore;
use crate::scheduler::{ScheduledAction, Scheduler};

/// Drives provision, check and retry for one node's subscriptions.
///
/// Every read-check-write of a subscription record happens under one async
/// lock, so concurrent callers for the same event class see each other's
/// pending record and never request the rule twice.
#[derive(Debug)]
pub struct SubscriptionProvisioner {
    node_id: String,
    event_bus: Arc<dyn EventBus>,
    store: Arc<dyn SubscriptionStore>,
    scheduler: Arc<dyn Scheduler>,
    initial_recheck: Duration,
    retry_interval: Duration,
    stats: Arc<TrackerStats>,
    lock: Mutex<()>,
}

impl SubscriptionProvisioner {
    pub fn new(
        node_id: impl Into<String>,
        config: &ProvisioningConfig,
        event_bus: Arc<dyn EventBus>,
        store: Arc<dyn SubscriptionStore>,
        scheduler: Arc<dyn Scheduler>,
        stats: Arc<TrackerStats>,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            event_bus,
            store,
            scheduler,
            initial_recheck: config.initial_recheck(),
            retry_interval: config.retry_interval(),
            stats,
            lock: Mutex::new(()),
        }
    }

    fn key_for(&self, pattern: &SubscriptionPattern) -> SubscriptionKey {
        SubscriptionKey::new(self.node_id.clone(), pattern.detail_type.clone())
    }

    /// Make sure the node is, or is becoming, subscribed to `pattern`
    pub async fn ensure_subscribed(
        &self,
        pattern: &SubscriptionPattern,
    ) -> TrackerResult<SubscriptionState> {
        let _guard = self.lock.lock().await;
        let key = self.key_for(pattern);

        if let Some(record) = self.store.load(&key).await? {
            if record.matches(pattern) {
                return Ok(match record.subscription_id {
                    Some(id) => SubscriptionState::Subscribed(id),
                    None => {
                        debug!(subscription = %key, "Subscription already pending");
                        SubscriptionState::Pending
                    }
                });
            }

            info!(
                subscription = %key,
                cached_region = %record.region,
                region = %pattern.region,
                "🔁 Region changed, re-provisioning subscription"
            );
            self.store.clear(&key).await?;
        }

        if self.event_bus.rule_exists(pattern).await? {
            let subscription_id = self.subscribe(&key, pattern).await?;
            return Ok(SubscriptionState::Subscribed(subscription_id));
        }

        // Fire-and-forget: availability is what the re-checks look at
        if let Err(error) = self.event_bus.request_rule(pattern).await {
            warn!(
                subscription = %key,
                region = %pattern.region,
                error = %error,
                "Rule creation request failed, re-checks continue"
            );
        }

        self.store
            .store(&key, SubscriptionRecord::pending(pattern))
            .await?;
        self.scheduler
            .schedule_call(
                ScheduledAction::provision_check(pattern.clone()),
                self.initial_recheck,
            )
            .await?;

        info!(
            subscription = %key,
            region = %pattern.region,
            recheck_after = ?self.initial_recheck,
            "⏳ Event-bus rule requested, subscription pending"
        );
        log_provisioning_event(&pattern.detail_type, &pattern.region, "pending", None);
        Ok(SubscriptionState::Pending)
    }

    /// Handle a provisioning re-check tick.
    ///
    /// Returns `None` when the tick is stale: the record was cleared, moved to
    /// another region, or is already subscribed.
    pub async fn on_provision_check(
        &self,
        pattern: &SubscriptionPattern,
    ) -> TrackerResult<Option<SubscriptionState>> {
        let _guard = self.lock.lock().await;
        let key = self.key_for(pattern);
        TrackerStats::incr(&self.stats.provisioning_checks);

        match self.store.load(&key).await? {
            Some(record) if record.matches(pattern) && record.is_pending() => {}
            _ => {
                debug!(subscription = %key, "Stale provisioning check ignored");
                return Ok(None);
            }
        }

        if self.event_bus.rule_exists(pattern).await? {
            let subscription_id = self.subscribe(&key, pattern).await?;
            return Ok(Some(SubscriptionState::Subscribed(subscription_id)));
        }

        self.scheduler
            .schedule_call(
                ScheduledAction::provision_check(pattern.clone()),
                self.retry_interval,
            )
            .await?;
        debug!(
            subscription = %key,
            retry_after = ?self.retry_interval,
            "Rule not available yet"
        );
        Ok(Some(SubscriptionState::Pending))
    }

    /// Cached subscription state for `pattern`'s event class, if any
    pub async fn current_state(
        &self,
        pattern: &SubscriptionPattern,
    ) -> TrackerResult<Option<SubscriptionState>> {
        let record = self.store.load(&self.key_for(pattern)).await?;
        Ok(record
            .filter(|record| record.matches(pattern))
            .map(|record| match record.subscription_id {
                Some(id) => SubscriptionState::Subscribed(id),
                None => SubscriptionState::Pending,
            }))
    }

    async fn subscribe(
        &self,
        key: &SubscriptionKey,
        pattern: &SubscriptionPattern,
    ) -> TrackerResult<String> {
        let subscription_id = self.event_bus.subscribe(pattern).await?;
        self.store
            .store(key, SubscriptionRecord::subscribed(pattern, &subscription_id))
            .await?;

        info!(
            subscription = %key,
            region = %pattern.region,
            subscription_id = %subscription_id,
            "✅ Subscribed to push notifications"
        );
        log_provisioning_event(
            &pattern.detail_type,
            &pattern.region,
            "subscribed",
            Some(&subscription_id),
        );
        Ok(subscription_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::InMemorySubscriptionStore;
    use crate::test_helpers::{ManualScheduler, MockEventBus};

    const DETAIL_TYPE: &str = "EC2 AMI State Change";

    struct Fixture {
        provisioner: Arc<SubscriptionProvisioner>,
        bus: Arc<MockEventBus>,
        scheduler: Arc<ManualScheduler>,
    }

    fn fixture(bus: MockEventBus) -> Fixture {
        let bus = Arc::new(bus);
        let scheduler = Arc::new(ManualScheduler::new());
        let provisioner = SubscriptionProvisioner::new(
            "node-1",
            &ProvisioningConfig::default(),
            bus.clone(),
            Arc::new(InMemorySubscriptionStore::new()),
            scheduler.clone(),
            Arc::new(TrackerStats::default()),
        );
        Fixture {
            provisioner: Arc::new(provisioner),
            bus,
            scheduler,
        }
    }

    fn pattern(region: &str) -> SubscriptionPattern {
        SubscriptionPattern::new(region, "aws.ec2", DETAIL_TYPE)
    }

    fn check_name() -> String {
        ScheduledAction::provision_check(pattern("us-east-1")).name()
    }

    #[tokio::test]
    async fn test_existing_rule_subscribes_immediately() {
        let f = fixture(MockEventBus::available());
        let state = f.provisioner.ensure_subscribed(&pattern("us-east-1")).await.unwrap();

        assert_eq!(state.subscription_id(), Some("sub-us-east-1-1"));
        assert_eq!(f.bus.request_rule_calls(), 0);
        assert_eq!(f.scheduler.armed_count(), 0);

        // Cached: no further bus traffic
        let again = f.provisioner.ensure_subscribed(&pattern("us-east-1")).await.unwrap();
        assert_eq!(again, state);
        assert_eq!(f.bus.subscribe_calls(), 1);
        assert_eq!(f.bus.rule_exists_calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_rule_requests_and_schedules_recheck() {
        let f = fixture(MockEventBus::available_after(2));
        let state = f.provisioner.ensure_subscribed(&pattern("us-east-1")).await.unwrap();

        assert!(state.is_pending());
        assert_eq!(f.bus.request_rule_calls(), 1);
        let armed = f.scheduler.armed(&check_name()).unwrap();
        assert_eq!(armed.after, Duration::from_secs(5));

        // First re-check: still missing, retry after the longer interval
        let action = f.scheduler.take(&check_name()).unwrap();
        let ScheduledAction::ProvisionCheck { pattern: checked } = action else {
            panic!("expected provisioning check");
        };
        let state = f.provisioner.on_provision_check(&checked).await.unwrap();
        assert_eq!(state, Some(SubscriptionState::Pending));
        assert_eq!(
            f.scheduler.armed(&check_name()).unwrap().after,
            Duration::from_secs(10)
        );

        // Second re-check: available, subscribe and stop
        f.scheduler.take(&check_name()).unwrap();
        let state = f.provisioner.on_provision_check(&checked).await.unwrap();
        assert!(matches!(state, Some(SubscriptionState::Subscribed(_))));
        assert!(!f.scheduler.is_armed(&check_name()));
        assert_eq!(f.bus.request_rule_calls(), 1);
        assert_eq!(f.bus.subscribe_calls(), 1);

        let cached = f.provisioner.current_state(&checked).await.unwrap();
        assert!(matches!(cached, Some(SubscriptionState::Subscribed(_))));
    }

    #[tokio::test]
    async fn test_concurrent_calls_arm_one_retry() {
        let f = fixture(MockEventBus::never_available());
        let first = {
            let provisioner = f.provisioner.clone();
            tokio::spawn(async move { provisioner.ensure_subscribed(&pattern("us-east-1")).await })
        };
        let second = {
            let provisioner = f.provisioner.clone();
            tokio::spawn(async move { provisioner.ensure_subscribed(&pattern("us-east-1")).await })
        };

        assert!(first.await.unwrap().unwrap().is_pending());
        assert!(second.await.unwrap().unwrap().is_pending());
        assert_eq!(f.bus.request_rule_calls(), 1);
        assert_eq!(f.scheduler.schedule_count(&check_name()), 1);
    }

    #[tokio::test]
    async fn test_region_change_reprovisions() {
        let f = fixture(MockEventBus::available());
        let east = f.provisioner.ensure_subscribed(&pattern("us-east-1")).await.unwrap();
        let west = f.provisioner.ensure_subscribed(&pattern("eu-west-1")).await.unwrap();

        assert_eq!(east.subscription_id(), Some("sub-us-east-1-1"));
        assert_eq!(west.subscription_id(), Some("sub-eu-west-1-2"));
        assert!(f
            .provisioner
            .current_state(&pattern("us-east-1"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_stale_check_is_ignored() {
        let f = fixture(MockEventBus::available());
        f.provisioner.ensure_subscribed(&pattern("us-east-1")).await.unwrap();

        let state = f
            .provisioner
            .on_provision_check(&pattern("us-east-1"))
            .await
            .unwrap();
        assert_eq!(state, None);
        assert_eq!(f.bus.subscribe_calls(), 1);
    }

    #[tokio::test]
    async fn test_bus_errors_propagate() {
        let f = fixture(MockEventBus::available());
        f.bus.fail_rule_exists(true);
        let error = f
            .provisioner
            .ensure_subscribed(&pattern("us-east-1"))
            .await
            .unwrap_err();
        assert!(matches!(error, crate::error::TrackerError::EventBusError { .. }));
        assert_eq!(f.scheduler.armed_count(), 0);

        f.bus.fail_rule_exists(false);
        f.bus.fail_subscribe(true);
        assert!(f
            .provisioner
            .ensure_subscribed(&pattern("us-east-1"))
            .await
            .is_err());
        assert!(f
            .provisioner
            .current_state(&pattern("us-east-1"))
            .await
            .unwrap()
            .is_none());
    }
}
