use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::result_emitter::{EmitOutcome, ResultEmitter};
use crate::constants::vendor_states;
use crate::error::{TrackerError, TrackerResult};
use crate::event_system::TrackerStats;
use crate::host::ExecutionHost;
use crate::models::{Operation, ResolutionChannel, TerminalTransition};
use crate::registry::OperationRegistry;
use crate::scheduler::{ScheduledAction, Scheduler};
use crate::state_machine::TerminalStatus;
use crate::vendors::{VendorAdapter, VendorStatus};

/// What a poll tick amounted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The owning execution already finished; the record is dropped and
    /// polling stops
    OwnerFinished,
    /// Operation unknown or already terminal; polling stops
    AlreadyResolved,
    /// Vendor still working; the next tick is armed
    Rescheduled,
    Applied(TerminalStatus),
}

/// Status-poll fallback path
#[derive(Debug, Clone)]
pub struct PollScheduler {
    adapter: VendorAdapter,
    registry: Arc<dyn OperationRegistry>,
    host: Arc<dyn ExecutionHost>,
    scheduler: Arc<dyn Scheduler>,
    emitter: ResultEmitter,
    stats: Arc<TrackerStats>,
    first_poll_delay: Duration,
    interval: Duration,
}

impl PollScheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        adapter: VendorAdapter,
        registry: Arc<dyn OperationRegistry>,
        host: Arc<dyn ExecutionHost>,
        scheduler: Arc<dyn Scheduler>,
        emitter: ResultEmitter,
        stats: Arc<TrackerStats>,
        first_poll_delay: Duration,
        interval: Duration,
    ) -> Self {
        Self {
            adapter,
            registry,
            host,
            scheduler,
            emitter,
            stats,
            first_poll_delay,
            interval,
        }
    }

    /// Arm the first tick for a freshly launched operation
    pub async fn arm(&self, correlation_key: &str) -> TrackerResult<()> {
        self.scheduler
            .schedule_call(
                ScheduledAction::poll_status(correlation_key),
                self.first_poll_delay,
            )
            .await
    }

    /// Drop any armed tick; `false` if none was armed
    pub async fn disarm(&self, correlation_key: &str) -> TrackerResult<bool> {
        self.scheduler
            .cancel_call(&ScheduledAction::poll_status(correlation_key).name())
            .await
    }

    pub async fn poll(&self, correlation_key: &str) -> TrackerResult<PollOutcome> {
        TrackerStats::incr(&self.stats.poll_ticks);

        let Some(operation) = self.registry.find_by_correlation_key(correlation_key).await? else {
            debug!(correlation_key = %correlation_key, "Poll tick for unknown operation");
            return Ok(PollOutcome::AlreadyResolved);
        };

        if self.host.is_finished(&operation.owner).await? {
            self.registry.remove(correlation_key).await?;
            debug!(
                correlation_key = %correlation_key,
                owner = %operation.owner,
                "Owning execution finished, polling stops"
            );
            return Ok(PollOutcome::OwnerFinished);
        }

        if operation.is_terminal() {
            return Ok(PollOutcome::AlreadyResolved);
        }

        let status = match self.query_status(correlation_key).await {
            Ok(status) => status,
            Err(error) => {
                self.fail_on_query_error(&operation, &error).await?;
                return Err(error);
            }
        };

        let kind = self.adapter.kind();
        let Some(terminal) = kind.translate_terminal_state(&status.status, &status.raw_detail)
        else {
            self.registry.mark_in_progress(correlation_key).await?;
            self.scheduler
                .schedule_call(ScheduledAction::poll_status(correlation_key), self.interval)
                .await?;
            TrackerStats::incr(&self.stats.polls_rescheduled);
            debug!(
                correlation_key = %correlation_key,
                state = %status.status,
                next_poll = ?self.interval,
                "Operation still running"
            );
            return Ok(PollOutcome::Rescheduled);
        };

        let error_message = kind.error_message(&status.raw_detail);
        let transition = TerminalTransition::new(
            terminal,
            status.status,
            status.raw_detail,
            ResolutionChannel::Poll,
        )
        .with_error_message(error_message);

        Ok(match self.emitter.apply_and_emit(&operation, transition).await? {
            EmitOutcome::Emitted => PollOutcome::Applied(terminal),
            EmitOutcome::AlreadyResolved => PollOutcome::AlreadyResolved,
        })
    }

    async fn query_status(&self, correlation_key: &str) -> TrackerResult<VendorStatus> {
        let status = self
            .adapter
            .client()
            .query_status(correlation_key)
            .await?;
        if status.identifier != correlation_key {
            return Err(TrackerError::vendor(
                "query_status",
                correlation_key,
                format!("status returned for {}", status.identifier),
            ));
        }
        Ok(status)
    }

    /// A failed status query ends the operation as `Failed` so the owning
    /// execution sees the error instead of waiting on a tick that never comes
    async fn fail_on_query_error(
        &self,
        operation: &Operation,
        error: &TrackerError,
    ) -> TrackerResult<()> {
        TrackerStats::incr(&self.stats.status_queries_failed);
        warn!(
            correlation_key = %operation.correlation_key,
            owner = %operation.owner,
            error = %error,
            "Vendor status query failed"
        );

        let transition = TerminalTransition::new(
            TerminalStatus::Failed,
            vendor_states::STATUS_QUERY_FAILED,
            Value::Null,
            ResolutionChannel::Poll,
        )
        .with_error_message(Some(error.to_string()));
        self.emitter.apply_and_emit(operation, transition).await?;
        Ok(())
    }
}
