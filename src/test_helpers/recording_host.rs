use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashSet;

use crate::error::TrackerResult;
use crate::host::{Emission, ExecutionHost};
use crate::models::ExecutionRef;

/// Host that keeps every emission in memory
#[derive(Debug, Default)]
pub struct RecordingHost {
    emissions: Mutex<Vec<Emission>>,
    finished: Mutex<HashSet<ExecutionRef>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emissions(&self) -> Vec<Emission> {
        self.emissions.lock().clone()
    }

    pub fn emissions_for(&self, owner: &ExecutionRef) -> Vec<Emission> {
        self.emissions
            .lock()
            .iter()
            .filter(|emission| emission.owner() == owner)
            .cloned()
            .collect()
    }

    pub fn emission_count(&self) -> usize {
        self.emissions.lock().len()
    }

    /// Finish an execution behind the tracker's back
    pub fn finish(&self, owner: &ExecutionRef) {
        self.finished.lock().insert(owner.clone());
    }
}

#[async_trait]
impl ExecutionHost for RecordingHost {
    async fn emit(
        &self,
        owner: &ExecutionRef,
        channel: &str,
        payload_type: &str,
        payload: Value,
    ) -> TrackerResult<()> {
        self.emissions.lock().push(Emission::Emitted {
            owner: owner.clone(),
            channel: channel.to_string(),
            payload_type: payload_type.to_string(),
            payload,
        });
        Ok(())
    }

    async fn fail(&self, owner: &ExecutionRef, message: &str) -> TrackerResult<()> {
        self.emissions.lock().push(Emission::Failed {
            owner: owner.clone(),
            message: message.to_string(),
        });
        Ok(())
    }

    async fn is_finished(&self, owner: &ExecutionRef) -> TrackerResult<bool> {
        Ok(self.finished.lock().contains(owner))
    }
}
