use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::error::{TrackerError, TrackerResult};
use crate::vendors::{VendorClient, VendorStatus};

/// Vendor client answering status queries from a per-key script.
///
/// Each key has a queue of states; every query pops one, and the last state
/// keeps being returned once the queue runs dry.
#[derive(Debug, Default)]
pub struct ScriptedVendorClient {
    scripts: Mutex<HashMap<String, VecDeque<ScriptedStatus>>>,
    started: Mutex<Vec<Value>>,
    cancelled: Mutex<Vec<String>>,
    next_key: AtomicUsize,
    query_calls: AtomicUsize,
    fail_queries: AtomicBool,
    fail_cancel: AtomicBool,
}

#[derive(Debug, Clone)]
struct ScriptedStatus {
    state: String,
    detail: Value,
}

impl ScriptedVendorClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `states` for `correlation_key`, each with a detail echoing it
    pub fn script(&self, correlation_key: &str, states: &[&str]) {
        let queue = states
            .iter()
            .map(|state| ScriptedStatus {
                state: state.to_string(),
                detail: json!({ "id": correlation_key, "state": state }),
            })
            .collect();
        self.scripts.lock().insert(correlation_key.to_string(), queue);
    }

    /// Queue one state with an explicit raw detail
    pub fn script_with_detail(&self, correlation_key: &str, state: &str, detail: Value) {
        self.scripts
            .lock()
            .entry(correlation_key.to_string())
            .or_default()
            .push_back(ScriptedStatus {
                state: state.to_string(),
                detail,
            });
    }

    pub fn fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    pub fn fail_cancel(&self, fail: bool) {
        self.fail_cancel.store(fail, Ordering::SeqCst);
    }

    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    pub fn started_requests(&self) -> Vec<Value> {
        self.started.lock().clone()
    }

    pub fn cancelled(&self) -> Vec<String> {
        self.cancelled.lock().clone()
    }
}

#[async_trait]
impl VendorClient for ScriptedVendorClient {
    async fn start_operation(&self, request: &Value) -> TrackerResult<String> {
        self.started.lock().push(request.clone());
        let sequence = self.next_key.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(request
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("op-{sequence}")))
    }

    async fn query_status(&self, correlation_key: &str) -> TrackerResult<VendorStatus> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(TrackerError::vendor(
                "query_status",
                correlation_key,
                "throttled",
            ));
        }

        let mut scripts = self.scripts.lock();
        let queue = scripts.get_mut(correlation_key).ok_or_else(|| {
            TrackerError::vendor("query_status", correlation_key, "no such operation")
        })?;
        let status = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
        .ok_or_else(|| TrackerError::vendor("query_status", correlation_key, "empty script"))?;

        Ok(VendorStatus::new(correlation_key, status.state, status.detail))
    }

    async fn cancel(&self, correlation_key: &str) -> TrackerResult<()> {
        if self.fail_cancel.load(Ordering::SeqCst) {
            return Err(TrackerError::vendor("cancel", correlation_key, "not cancellable"));
        }
        self.cancelled.lock().push(correlation_key.to_string());
        Ok(())
    }
}
