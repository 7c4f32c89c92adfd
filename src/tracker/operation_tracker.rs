//! # Operation Tracker
//!
//! Composition root for one operation kind on one node. The host calls in
//! through four entry points, any of which may run concurrently with the
//! others, including for the same correlation key:
//!
//! - [`OperationTracker::launch`] when an adapter started an operation
//! - [`OperationTracker::on_push_event`] for every event-bus delivery
//! - [`OperationTracker::handle_scheduled_action`] when a delayed call fires
//! - [`OperationTracker::cancel`] when the owning execution is cancelled

use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::event_correlator::{EventCorrelator, PushOutcome};
use super::poll_scheduler::{PollOutcome, PollScheduler};
use super::result_emitter::ResultEmitter;
use crate::config::TrackerConfig;
use crate::error::{TrackerError, TrackerResult};
use crate::event_system::{DeploymentMode, TrackerStats, TrackerStatsSnapshot};
use crate::host::ExecutionHost;
use crate::logging::{log_error, log_operation_event};
use crate::models::{
    ExecutionRef, NewOperation, Operation, PushEvent, SubscriptionPattern, SubscriptionState,
};
use crate::provisioning::{EventBus, SubscriptionProvisioner};
use crate::registry::{OperationRegistry, SubscriptionStore};
use crate::scheduler::{ScheduledAction, Scheduler};
use crate::vendors::VendorAdapter;

/// Collaborators a tracker is assembled from
#[derive(Debug, Clone)]
pub struct TrackerComponents {
    pub adapter: VendorAdapter,
    pub registry: Arc<dyn OperationRegistry>,
    pub subscriptions: Arc<dyn SubscriptionStore>,
    pub host: Arc<dyn ExecutionHost>,
    pub scheduler: Arc<dyn Scheduler>,
    pub event_bus: Arc<dyn EventBus>,
}

#[derive(Debug)]
pub struct OperationTracker {
    config: TrackerConfig,
    adapter: VendorAdapter,
    registry: Arc<dyn OperationRegistry>,
    provisioner: SubscriptionProvisioner,
    correlator: EventCorrelator,
    poller: PollScheduler,
    stats: Arc<TrackerStats>,
}

impl OperationTracker {
    pub fn new(config: TrackerConfig, components: TrackerComponents) -> TrackerResult<Self> {
        config.validate()?;

        let TrackerComponents {
            adapter,
            registry,
            subscriptions,
            host,
            scheduler,
            event_bus,
        } = components;

        let stats = Arc::new(TrackerStats::default());
        let kind = adapter.kind_arc();

        let emitter = ResultEmitter::new(
            kind.clone(),
            registry.clone(),
            host.clone(),
            stats.clone(),
        );
        let provisioner = SubscriptionProvisioner::new(
            config.node_id.clone(),
            &config.provisioning,
            event_bus,
            subscriptions,
            scheduler.clone(),
            stats.clone(),
        );
        let correlator =
            EventCorrelator::new(kind, registry.clone(), emitter.clone(), stats.clone());
        let poller = PollScheduler::new(
            adapter.clone(),
            registry.clone(),
            host,
            scheduler,
            emitter,
            stats.clone(),
            config.polling.first_poll_delay(),
            config.polling.interval(),
        );

        info!(
            node_id = %config.node_id,
            kind = %adapter.kind().kind(),
            deployment_mode = %config.deployment_mode,
            polling = config.polling_active(),
            push = config.push_active(),
            "🚀 Operation tracker initialized"
        );

        Ok(Self {
            config,
            adapter,
            registry,
            provisioner,
            correlator,
            poller,
            stats,
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn deployment_mode(&self) -> DeploymentMode {
        self.config.deployment_mode
    }

    /// Track an operation the adapter already started, in the default region
    pub async fn launch(&self, correlation_key: &str, owner: ExecutionRef) -> TrackerResult<Operation> {
        let region = self.default_region()?;
        self.launch_in_region(correlation_key, owner, region.as_deref())
            .await
    }

    /// Track an operation whose push notifications arrive from `region`
    pub async fn launch_in_region(
        &self,
        correlation_key: &str,
        owner: ExecutionRef,
        region: Option<&str>,
    ) -> TrackerResult<Operation> {
        self.ensure_enabled()?;
        if correlation_key.trim().is_empty() {
            return Err(TrackerError::ValidationError(
                "correlation key must not be empty".to_string(),
            ));
        }

        self.prepare_push(region).await?;
        self.track(correlation_key, owner).await
    }

    /// Start an operation through the vendor client and track it
    pub async fn start_and_launch(
        &self,
        request: &Value,
        owner: ExecutionRef,
        region: Option<&str>,
    ) -> TrackerResult<Operation> {
        self.ensure_enabled()?;
        let region = match region {
            Some(region) => Some(region.to_string()),
            None => self.default_region()?,
        };

        // Subscribe before starting so an early completion event is not missed
        self.prepare_push(region.as_deref()).await?;
        let correlation_key = self.adapter.client().start_operation(request).await?;
        self.track(&correlation_key, owner).await
    }

    /// Best-effort vendor cancellation.
    ///
    /// Returns whether a cancellation was requested. Vendor failures are
    /// logged, not returned, and the operation keeps being tracked until a
    /// channel observes its terminal state.
    pub async fn cancel(&self, correlation_key: &str) -> TrackerResult<bool> {
        let Some(operation) = self.registry.find_by_correlation_key(correlation_key).await? else {
            debug!(correlation_key = %correlation_key, "Cancel for unknown operation");
            return Ok(false);
        };
        if operation.is_terminal() {
            debug!(
                correlation_key = %correlation_key,
                status = %operation.status,
                "Cancel after terminal state, nothing to do"
            );
            return Ok(false);
        }

        TrackerStats::incr(&self.stats.cancellations_requested);
        if let Err(error) = self.adapter.client().cancel(correlation_key).await {
            TrackerStats::incr(&self.stats.cancellations_failed);
            warn!(
                correlation_key = %correlation_key,
                error = %error,
                "Vendor cancellation failed"
            );
        } else {
            log_operation_event(correlation_key, "cancel_requested", None, None);
        }
        Ok(true)
    }

    /// Push-notification entry point
    pub async fn on_push_event(&self, event: &PushEvent) -> TrackerResult<PushOutcome> {
        if !self.config.push_active() {
            TrackerStats::incr(&self.stats.push_events_ignored);
            debug!(
                deployment_mode = %self.config.deployment_mode,
                "Push event ignored, push delivery inactive"
            );
            return Ok(PushOutcome::Ignored);
        }

        let outcome = self.correlator.on_push_event(event).await?;
        if let (PushOutcome::Applied(_), Some(observation)) =
            (outcome, self.adapter.kind().observe(event))
        {
            // Push won; the armed poll tick has nothing left to do
            self.poller.disarm(&observation.identifier).await?;
        }
        Ok(outcome)
    }

    /// Poll-tick entry point
    pub async fn poll(&self, correlation_key: &str) -> TrackerResult<PollOutcome> {
        self.poller.poll(correlation_key).await
    }

    /// Dispatch a fired delayed call
    pub async fn handle_scheduled_action(&self, action: ScheduledAction) -> TrackerResult<()> {
        debug!(action = %action, "Scheduled action fired");
        match action {
            ScheduledAction::PollStatus { correlation_key } => {
                self.poll(&correlation_key).await?;
            }
            ScheduledAction::ProvisionCheck { pattern } => {
                self.provisioner.on_provision_check(&pattern).await?;
            }
        }
        Ok(())
    }

    /// Consume fired actions until the channel closes.
    ///
    /// Each action runs on its own task so a slow vendor call never delays
    /// other operations. Failures are logged; the loop keeps going.
    pub async fn run(self: Arc<Self>, mut actions: mpsc::Receiver<ScheduledAction>) {
        info!(node_id = %self.config.node_id, "🔄 Scheduled action loop started");

        while let Some(action) = actions.recv().await {
            let tracker = Arc::clone(&self);
            tokio::spawn(async move {
                let name = action.name();
                if let Err(error) = tracker.handle_scheduled_action(action).await {
                    log_error(
                        "operation_tracker",
                        "handle_scheduled_action",
                        &error.to_string(),
                        Some(&name),
                    );
                }
            });
        }

        info!(node_id = %self.config.node_id, "Scheduled action loop stopped");
    }

    /// Node removal hook. Subscriptions stay in place: they are shared by
    /// every execution on the node and re-provisioning is slow.
    pub async fn cleanup(&self) -> TrackerResult<()> {
        info!(
            node_id = %self.config.node_id,
            kind = %self.adapter.kind().kind(),
            "🧹 Node cleanup: push subscriptions retained"
        );
        Ok(())
    }

    pub fn stats(&self) -> TrackerStatsSnapshot {
        self.stats.snapshot()
    }

    /// Subscription pattern for this tracker's operation kind in `region`
    pub fn subscription_pattern(&self, region: &str) -> SubscriptionPattern {
        self.adapter.kind().subscription_pattern(region)
    }

    pub async fn subscription_state(&self, region: &str) -> TrackerResult<Option<SubscriptionState>> {
        self.provisioner
            .current_state(&self.subscription_pattern(region))
            .await
    }

    fn ensure_enabled(&self) -> TrackerResult<()> {
        if self.config.deployment_mode.is_disabled() {
            return Err(TrackerError::Disabled(self.config.node_id.clone()));
        }
        Ok(())
    }

    fn default_region(&self) -> TrackerResult<Option<String>> {
        let region = self.config.provisioning.default_region.clone();
        if region.is_none() && self.config.push_active() {
            return Err(TrackerError::ConfigurationError(
                "provisioning.default_region is required when push delivery is active".to_string(),
            ));
        }
        Ok(region)
    }

    async fn prepare_push(&self, region: Option<&str>) -> TrackerResult<()> {
        if !self.config.push_active() {
            return Ok(());
        }
        let region = region.ok_or_else(|| {
            TrackerError::ConfigurationError(
                "a region is required when push delivery is active".to_string(),
            )
        })?;

        let state = self
            .provisioner
            .ensure_subscribed(&self.subscription_pattern(region))
            .await?;
        if state.is_pending() && !self.config.polling_active() {
            warn!(
                region = %region,
                "Push subscription pending and polling disabled, results wait for the rule"
            );
        }
        Ok(())
    }

    async fn track(&self, correlation_key: &str, owner: ExecutionRef) -> TrackerResult<Operation> {
        let operation = self
            .registry
            .register(NewOperation::new(
                correlation_key,
                self.adapter.kind().kind(),
                owner,
            ))
            .await?;
        TrackerStats::incr(&self.stats.operations_launched);

        if self.config.polling_active() {
            self.poller.arm(correlation_key).await?;
        }

        log_operation_event(
            correlation_key,
            "launched",
            Some(operation.status.as_str()),
            None,
        );
        info!(
            correlation_key = %correlation_key,
            owner = %operation.owner,
            kind = %operation.kind,
            "📋 Operation tracked"
        );
        Ok(operation)
    }
}
