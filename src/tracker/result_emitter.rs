use std::sync::Arc;
use tracing::{debug, info};

use crate::error::TrackerResult;
use crate::event_system::TrackerStats;
use crate::host::{build_payload, ExecutionHost};
use crate::logging::log_operation_event;
use crate::models::{Operation, TerminalTransition};
use crate::registry::OperationRegistry;
use crate::state_machine::OperationStatus;
use crate::vendors::OperationKind;

/// What happened when a channel offered a terminal outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitOutcome {
    /// This channel won and the result went to the host
    Emitted,
    /// Another channel already applied a terminal transition
    AlreadyResolved,
}

/// Applies a terminal transition and, only when it wins, hands the result to
/// the host. Both completion channels go through here so their emissions
/// cannot diverge.
#[derive(Debug, Clone)]
pub struct ResultEmitter {
    kind: Arc<dyn OperationKind>,
    registry: Arc<dyn OperationRegistry>,
    host: Arc<dyn ExecutionHost>,
    stats: Arc<TrackerStats>,
}

impl ResultEmitter {
    pub fn new(
        kind: Arc<dyn OperationKind>,
        registry: Arc<dyn OperationRegistry>,
        host: Arc<dyn ExecutionHost>,
        stats: Arc<TrackerStats>,
    ) -> Self {
        Self {
            kind,
            registry,
            host,
            stats,
        }
    }

    pub async fn apply_and_emit(
        &self,
        operation: &Operation,
        transition: TerminalTransition,
    ) -> TrackerResult<EmitOutcome> {
        let key = operation.correlation_key.as_str();

        if !self.registry.try_apply_terminal(key, &transition).await? {
            TrackerStats::incr(&self.stats.races_lost);
            debug!(
                correlation_key = %key,
                channel = %transition.resolved_by,
                "Terminal outcome already applied by another channel"
            );
            return Ok(EmitOutcome::AlreadyResolved);
        }

        self.stats.record_resolution(transition.resolved_by);
        log_operation_event(
            key,
            "resolved",
            Some(OperationStatus::from(transition.status).as_str()),
            Some(transition.resolved_by.as_str()),
        );

        if transition.status.fails_execution() {
            let message = transition.error_message.clone().unwrap_or_else(|| {
                format!(
                    "{} {} finished in state {}",
                    self.kind.kind(),
                    key,
                    transition.vendor_state
                )
            });
            self.host.fail(&operation.owner, &message).await?;
            info!(
                correlation_key = %key,
                owner = %operation.owner,
                channel = %transition.resolved_by,
                error_message = %message,
                "❌ Operation failed, owning execution marked failed"
            );
        } else {
            let channel = transition.status.channel();
            let payload = build_payload(self.kind.as_ref(), key, &transition);
            self.host
                .emit(&operation.owner, channel, self.kind.payload_type(), payload)
                .await?;
            info!(
                correlation_key = %key,
                owner = %operation.owner,
                status = %transition.status,
                output = channel,
                channel = %transition.resolved_by,
                "✅ Operation result emitted"
            );
        }

        Ok(EmitOutcome::Emitted)
    }
}
