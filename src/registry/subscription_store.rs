use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;

use crate::error::TrackerResult;
use crate::models::{SubscriptionKey, SubscriptionRecord};

/// Node-scoped metadata holding subscription records
#[async_trait]
pub trait SubscriptionStore: Send + Sync + fmt::Debug {
    async fn load(&self, key: &SubscriptionKey) -> TrackerResult<Option<SubscriptionRecord>>;

    async fn store(&self, key: &SubscriptionKey, record: SubscriptionRecord) -> TrackerResult<()>;

    async fn clear(&self, key: &SubscriptionKey) -> TrackerResult<Option<SubscriptionRecord>>;
}

#[derive(Debug, Default)]
pub struct InMemorySubscriptionStore {
    records: RwLock<HashMap<SubscriptionKey, SubscriptionRecord>>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn load(&self, key: &SubscriptionKey) -> TrackerResult<Option<SubscriptionRecord>> {
        Ok(self.records.read().get(key).cloned())
    }

    async fn store(&self, key: &SubscriptionKey, record: SubscriptionRecord) -> TrackerResult<()> {
        self.records.write().insert(key.clone(), record);
        Ok(())
    }

    async fn clear(&self, key: &SubscriptionKey) -> TrackerResult<Option<SubscriptionRecord>> {
        Ok(self.records.write().remove(key))
    }
}
