use std::sync::Arc;

use crate::config::TrackerConfig;
use crate::error::TrackerResult;
use crate::registry::{InMemoryOperationRegistry, InMemorySubscriptionStore};
use crate::tracker::{OperationTracker, TrackerComponents};
use crate::vendors::{ImageKind, OperationKind, VendorAdapter};

use super::manual_scheduler::ManualScheduler;
use super::mock_event_bus::MockEventBus;
use super::mock_vendor::ScriptedVendorClient;
use super::recording_host::RecordingHost;
use super::test_utils::test_config;

/// A tracker wired to in-process doubles, with handles on every double
#[derive(Debug)]
pub struct TrackerHarness {
    pub tracker: Arc<OperationTracker>,
    pub vendor: Arc<ScriptedVendorClient>,
    pub host: Arc<RecordingHost>,
    pub scheduler: Arc<ManualScheduler>,
    pub event_bus: Arc<MockEventBus>,
    pub registry: Arc<InMemoryOperationRegistry>,
    pub subscriptions: Arc<InMemorySubscriptionStore>,
}

impl TrackerHarness {
    /// Image tracker, test configuration, rule already available
    pub fn new() -> TrackerResult<Self> {
        Self::build(test_config(), Arc::new(ImageKind), MockEventBus::available())
    }

    pub fn with_config(config: TrackerConfig) -> TrackerResult<Self> {
        Self::build(config, Arc::new(ImageKind), MockEventBus::available())
    }

    pub fn build(
        config: TrackerConfig,
        kind: Arc<dyn OperationKind>,
        event_bus: MockEventBus,
    ) -> TrackerResult<Self> {
        let vendor = Arc::new(ScriptedVendorClient::new());
        let host = Arc::new(RecordingHost::new());
        let scheduler = Arc::new(ManualScheduler::new());
        let event_bus = Arc::new(event_bus);
        let registry = Arc::new(InMemoryOperationRegistry::new());
        let subscriptions = Arc::new(InMemorySubscriptionStore::new());

        let tracker = OperationTracker::new(
            config,
            TrackerComponents {
                adapter: VendorAdapter::new(kind, vendor.clone()),
                registry: registry.clone(),
                subscriptions: subscriptions.clone(),
                host: host.clone(),
                scheduler: scheduler.clone(),
                event_bus: event_bus.clone(),
            },
        )?;

        Ok(Self {
            tracker: Arc::new(tracker),
            vendor,
            host,
            scheduler,
            event_bus,
            registry,
            subscriptions,
        })
    }
}
