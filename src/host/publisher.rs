use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashSet;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

use super::ExecutionHost;
use crate::error::TrackerResult;
use crate::models::ExecutionRef;

/// What the tracker handed to the host
#[derive(Debug, Clone, PartialEq)]
pub enum Emission {
    Emitted {
        owner: ExecutionRef,
        channel: String,
        payload_type: String,
        payload: Value,
    },
    Failed {
        owner: ExecutionRef,
        message: String,
    },
}

impl Emission {
    pub fn owner(&self) -> &ExecutionRef {
        match self {
            Self::Emitted { owner, .. } | Self::Failed { owner, .. } => owner,
        }
    }
}

/// Emission that has been published
#[derive(Debug, Clone)]
pub struct PublishedEmission {
    pub emission: Emission,
    pub published_at: DateTime<Utc>,
}

/// In-process host that broadcasts emissions to any number of listeners.
///
/// An execution counts as finished once anything was emitted for it or it was
/// failed.
#[derive(Debug, Clone)]
pub struct EmissionPublisher {
    sender: broadcast::Sender<PublishedEmission>,
    finished: Arc<DashSet<ExecutionRef>>,
}

impl EmissionPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            finished: Arc::new(DashSet::new()),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEmission> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Mark an execution finished without emitting anything for it
    pub fn mark_finished(&self, owner: &ExecutionRef) {
        self.finished.insert(owner.clone());
    }

    fn publish(&self, emission: Emission) {
        self.finished.insert(emission.owner().clone());

        let published = PublishedEmission {
            emission,
            published_at: Utc::now(),
        };
        // No listeners is fine
        if self.sender.send(published).is_err() {
            debug!("Emission published with no listeners");
        }
    }
}

impl Default for EmissionPublisher {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[async_trait]
impl ExecutionHost for EmissionPublisher {
    async fn emit(
        &self,
        owner: &ExecutionRef,
        channel: &str,
        payload_type: &str,
        payload: Value,
    ) -> TrackerResult<()> {
        self.publish(Emission::Emitted {
            owner: owner.clone(),
            channel: channel.to_string(),
            payload_type: payload_type.to_string(),
            payload,
        });
        Ok(())
    }

    async fn fail(&self, owner: &ExecutionRef, message: &str) -> TrackerResult<()> {
        self.publish(Emission::Failed {
            owner: owner.clone(),
            message: message.to_string(),
        });
        Ok(())
    }

    async fn is_finished(&self, owner: &ExecutionRef) -> TrackerResult<bool> {
        Ok(self.finished.contains(owner))
    }
}
