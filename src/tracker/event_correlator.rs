use std::sync::Arc;
use tracing::debug;

use super::result_emitter::{EmitOutcome, ResultEmitter};
use crate::error::TrackerResult;
use crate::event_system::TrackerStats;
use crate::models::{PushEvent, ResolutionChannel, TerminalTransition};
use crate::registry::OperationRegistry;
use crate::state_machine::TerminalStatus;
use crate::vendors::OperationKind;

/// What a push notification amounted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Wrong event class, undecodable detail, or missing identifier/state
    Ignored,
    /// State outside the terminal allow-list
    NotTerminal,
    /// No operation registered under the identifier
    UnknownOperation,
    /// The poll path resolved the operation first
    AlreadyResolved,
    Applied(TerminalStatus),
}

/// Push-notification path: correlate an event with a registered operation and
/// apply its terminal outcome
#[derive(Debug, Clone)]
pub struct EventCorrelator {
    kind: Arc<dyn OperationKind>,
    registry: Arc<dyn OperationRegistry>,
    emitter: ResultEmitter,
    stats: Arc<TrackerStats>,
}

impl EventCorrelator {
    pub fn new(
        kind: Arc<dyn OperationKind>,
        registry: Arc<dyn OperationRegistry>,
        emitter: ResultEmitter,
        stats: Arc<TrackerStats>,
    ) -> Self {
        Self {
            kind,
            registry,
            emitter,
            stats,
        }
    }

    pub async fn on_push_event(&self, event: &PushEvent) -> TrackerResult<PushOutcome> {
        TrackerStats::incr(&self.stats.push_events_received);

        if event.source != self.kind.event_source() || event.detail_type != self.kind.detail_type()
        {
            return Ok(self.ignore(event, "event class not subscribed"));
        }

        let Some(observation) = self.kind.observe(event) else {
            return Ok(self.ignore(event, "identifier or state missing"));
        };

        let Some(status) = self
            .kind
            .translate_terminal_state(&observation.state, &event.detail)
        else {
            debug!(
                correlation_key = %observation.identifier,
                state = %observation.state,
                "Non-terminal state ignored"
            );
            TrackerStats::incr(&self.stats.push_events_ignored);
            return Ok(PushOutcome::NotTerminal);
        };

        let Some(operation) = self
            .registry
            .find_by_correlation_key(&observation.identifier)
            .await?
        else {
            debug!(
                correlation_key = %observation.identifier,
                "Push event for an operation this node does not track"
            );
            TrackerStats::incr(&self.stats.push_events_ignored);
            return Ok(PushOutcome::UnknownOperation);
        };

        let transition = TerminalTransition::new(
            status,
            observation.state,
            event.detail.clone(),
            ResolutionChannel::Push,
        )
        .with_error_message(self.kind.error_message(&event.detail));

        Ok(match self.emitter.apply_and_emit(&operation, transition).await? {
            EmitOutcome::Emitted => PushOutcome::Applied(status),
            EmitOutcome::AlreadyResolved => PushOutcome::AlreadyResolved,
        })
    }

    fn ignore(&self, event: &PushEvent, reason: &str) -> PushOutcome {
        debug!(
            source = %event.source,
            detail_type = %event.detail_type,
            reason = reason,
            "Push event discarded"
        );
        TrackerStats::incr(&self.stats.push_events_ignored);
        PushOutcome::Ignored
    }
}
