//! Runtime counters for a tracker node.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::models::ResolutionChannel;

/// Lock-free counters updated from every entry point
#[derive(Debug, Default)]
pub struct TrackerStats {
    pub operations_launched: AtomicU64,
    pub push_events_received: AtomicU64,
    pub push_events_ignored: AtomicU64,
    pub poll_ticks: AtomicU64,
    pub polls_rescheduled: AtomicU64,
    pub status_queries_failed: AtomicU64,
    pub resolved_by_push: AtomicU64,
    pub resolved_by_poll: AtomicU64,
    pub races_lost: AtomicU64,
    pub cancellations_requested: AtomicU64,
    pub cancellations_failed: AtomicU64,
    pub provisioning_checks: AtomicU64,
}

impl TrackerStats {
    pub fn record_resolution(&self, channel: ResolutionChannel) {
        match channel {
            ResolutionChannel::Push => self.resolved_by_push.fetch_add(1, Ordering::Relaxed),
            ResolutionChannel::Poll => self.resolved_by_poll.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> TrackerStatsSnapshot {
        TrackerStatsSnapshot {
            operations_launched: self.operations_launched.load(Ordering::Relaxed),
            push_events_received: self.push_events_received.load(Ordering::Relaxed),
            push_events_ignored: self.push_events_ignored.load(Ordering::Relaxed),
            poll_ticks: self.poll_ticks.load(Ordering::Relaxed),
            polls_rescheduled: self.polls_rescheduled.load(Ordering::Relaxed),
            status_queries_failed: self.status_queries_failed.load(Ordering::Relaxed),
            resolved_by_push: self.resolved_by_push.load(Ordering::Relaxed),
            resolved_by_poll: self.resolved_by_poll.load(Ordering::Relaxed),
            races_lost: self.races_lost.load(Ordering::Relaxed),
            cancellations_requested: self.cancellations_requested.load(Ordering::Relaxed),
            cancellations_failed: self.cancellations_failed.load(Ordering::Relaxed),
            provisioning_checks: self.provisioning_checks.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`TrackerStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerStatsSnapshot {
    pub operations_launched: u64,
    pub push_events_received: u64,
    pub push_events_ignored: u64,
    pub poll_ticks: u64,
    pub polls_rescheduled: u64,
    pub status_queries_failed: u64,
    pub resolved_by_push: u64,
    pub resolved_by_poll: u64,
    pub races_lost: u64,
    pub cancellations_requested: u64,
    pub cancellations_failed: u64,
    pub provisioning_checks: u64,
}

impl TrackerStatsSnapshot {
    /// Total terminal transitions applied by either channel
    pub fn resolved(&self) -> u64 {
        self.resolved_by_push + self.resolved_by_poll
    }

    /// Share of resolutions won by push delivery (1.0 when nothing resolved yet)
    pub fn push_share(&self) -> f64 {
        let total = self.resolved();
        if total == 0 {
            1.0
        } else {
            self.resolved_by_push as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_counters() {
        let stats = TrackerStats::default();
        stats.record_resolution(ResolutionChannel::Push);
        stats.record_resolution(ResolutionChannel::Push);
        stats.record_resolution(ResolutionChannel::Poll);
        TrackerStats::incr(&stats.races_lost);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.resolved(), 3);
        assert_eq!(snapshot.races_lost, 1);
        assert!((snapshot.push_share() - 2.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_push_share() {
        assert_eq!(TrackerStatsSnapshot::default().push_share(), 1.0);
    }
}
