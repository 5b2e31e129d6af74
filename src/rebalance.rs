//! Consumer-group rebalance state tracking
//!
//! [`RebalanceState`] is the one object in the dashboard mutated from
//! two threads: the poll worker (via the rebalance callback that the
//! client invokes synchronously inside a poll call) and nobody else;
//! the renderer only ever takes value snapshots. A single mutex guards
//! the whole record; critical sections do no I/O and never touch the
//! event queue, so the callback cannot deadlock against the renderer.
//!
//! [`WatchConsumerContext`] is the rdkafka `ConsumerContext` that
//! drives the state machine from the `pre_rebalance`/`post_rebalance`
//! hooks. The client's default `rebalance()` wrapper performs the
//! partition assign/unassign acknowledgement exactly once between the
//! two hooks, so the hooks themselves only record state.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rdkafka::consumer::{ConsumerContext, Rebalance};
use rdkafka::ClientContext;
use tracing::{info, warn};

/// Consumer-group health as shown in the dashboard header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupState {
    /// No rebalance observed yet.
    Unknown,
    /// The group is mid-rebalance; partitions are being assigned.
    Assigning,
    /// The group is mid-rebalance; partitions are being revoked.
    Revoking,
    /// Assignment is settled.
    Stable,
    /// The last rebalance reported an error.
    Error,
}

impl GroupState {
    /// Display string for the status line.
    pub fn as_str(self) -> &'static str {
        match self {
            GroupState::Unknown => "Unknown",
            GroupState::Assigning => "Rebalancing - Assigning",
            GroupState::Revoking => "Rebalancing - Revoking",
            GroupState::Stable => "Stable",
            GroupState::Error => "Error",
        }
    }

    /// Whether this state is one of the in-flight rebalance phases.
    pub fn is_rebalancing(self) -> bool {
        matches!(self, GroupState::Assigning | GroupState::Revoking)
    }
}

/// Value snapshot of [`RebalanceState`], safe to read without locking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupStateInfo {
    /// Whether a rebalance is currently in flight.
    pub is_rebalancing: bool,
    /// When the group last entered or left a rebalance phase.
    pub last_rebalance: Option<DateTime<Utc>>,
    /// Current phase.
    pub state: GroupState,
}

/// Mutex-guarded consumer-group health record.
///
/// Created once at consumer startup, shared via `Arc` with the
/// consumer context, and dropped after the poll worker has been
/// joined, so it outlives every callback that references it. The flag,
/// timestamp, and state are always written together under one lock
/// acquisition, so a snapshot never reflects a partial update.
pub struct RebalanceState {
    inner: Mutex<GroupStateInfo>,
}

impl Default for RebalanceState {
    fn default() -> Self {
        Self::new()
    }
}

impl RebalanceState {
    /// Creates a new state record in the `Unknown` phase.
    pub fn new() -> Self {
        RebalanceState {
            inner: Mutex::new(GroupStateInfo {
                is_rebalancing: false,
                last_rebalance: None,
                state: GroupState::Unknown,
            }),
        }
    }

    /// Moves the group into `state`.
    ///
    /// `is_rebalancing` is derived from the new state in the same
    /// critical section, and `last_rebalance` is stamped whenever the
    /// group enters or leaves a rebalance phase, so consecutive stamps
    /// are non-decreasing and the three fields stay mutually
    /// consistent.
    pub fn update(&self, state: GroupState) {
        let mut inner = self.inner.lock().expect("rebalance state lock poisoned");
        let was_rebalancing = inner.is_rebalancing;
        inner.state = state;
        inner.is_rebalancing = state.is_rebalancing();
        if inner.is_rebalancing || was_rebalancing {
            inner.last_rebalance = Some(Utc::now());
        }
    }

    /// Returns a value copy of the current state.
    ///
    /// This is the only way the renderer observes the record; it never
    /// holds a reference into the live structure.
    pub fn snapshot(&self) -> GroupStateInfo {
        self.inner
            .lock()
            .expect("rebalance state lock poisoned")
            .clone()
    }
}

/// rdkafka consumer context holding a shared reference to the
/// rebalance record.
///
/// The hooks run on the poll worker's thread, synchronously inside the
/// client's poll call. They must not block on the event queue or UI
/// state; their only job is to record the phase transition.
pub struct WatchConsumerContext {
    rebalance: Arc<RebalanceState>,
}

impl WatchConsumerContext {
    /// Creates a context that records transitions into `rebalance`.
    pub fn new(rebalance: Arc<RebalanceState>) -> Self {
        WatchConsumerContext { rebalance }
    }
}

impl ClientContext for WatchConsumerContext {}

impl ConsumerContext for WatchConsumerContext {
    fn pre_rebalance(&self, rebalance: &Rebalance<'_>) {
        match rebalance {
            Rebalance::Assign(tpl) => {
                info!(partitions = tpl.count(), "rebalance: assigning partitions");
                self.rebalance.update(GroupState::Assigning);
            }
            Rebalance::Revoke(tpl) => {
                info!(partitions = tpl.count(), "rebalance: revoking partitions");
                self.rebalance.update(GroupState::Revoking);
            }
            Rebalance::Error(err) => {
                warn!(error = %err, "rebalance error");
                self.rebalance.update(GroupState::Error);
            }
        }
    }

    fn post_rebalance(&self, rebalance: &Rebalance<'_>) {
        match rebalance {
            Rebalance::Assign(tpl) => {
                info!(partitions = tpl.count(), "rebalance complete");
                self.rebalance.update(GroupState::Stable);
            }
            Rebalance::Revoke(_) => {
                // Revocation completed; an assignment round follows, so
                // the group is still mid-rebalance.
            }
            Rebalance::Error(err) => {
                warn!(error = %err, "rebalance error");
                self.rebalance.update(GroupState::Error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_unknown() {
        let state = RebalanceState::new();
        let snap = state.snapshot();
        assert!(!snap.is_rebalancing);
        assert!(snap.last_rebalance.is_none());
        assert_eq!(snap.state, GroupState::Unknown);
    }

    #[test]
    fn test_assign_complete_cycle() {
        let state = RebalanceState::new();
        state.update(GroupState::Stable);

        // Simulated "assign partitions" callback followed by completion.
        state.update(GroupState::Assigning);
        let mid = state.snapshot();
        assert!(mid.is_rebalancing);
        assert_eq!(mid.state, GroupState::Assigning);
        let first_stamp = mid.last_rebalance.unwrap();

        state.update(GroupState::Stable);
        let done = state.snapshot();
        assert!(!done.is_rebalancing);
        assert_eq!(done.state, GroupState::Stable);
        assert!(done.last_rebalance.unwrap() >= first_stamp);
    }

    #[test]
    fn test_snapshot_is_never_partially_rebalancing() {
        let state = RebalanceState::new();
        for next in [
            GroupState::Stable,
            GroupState::Assigning,
            GroupState::Revoking,
            GroupState::Stable,
            GroupState::Error,
        ] {
            state.update(next);
            let snap = state.snapshot();
            assert_eq!(snap.is_rebalancing, snap.state.is_rebalancing());
        }
    }

    #[test]
    fn test_stable_transition_does_not_stamp_without_rebalance() {
        let state = RebalanceState::new();
        state.update(GroupState::Stable);
        // Never rebalanced, so there is nothing to date.
        assert!(state.snapshot().last_rebalance.is_none());
    }

    #[test]
    fn test_snapshot_is_detached_from_live_state() {
        let state = RebalanceState::new();
        let before = state.snapshot();
        state.update(GroupState::Assigning);
        assert_eq!(before.state, GroupState::Unknown);
        assert_eq!(state.snapshot().state, GroupState::Assigning);
    }

    #[test]
    fn test_state_labels() {
        assert_eq!(GroupState::Assigning.as_str(), "Rebalancing - Assigning");
        assert_eq!(GroupState::Revoking.as_str(), "Rebalancing - Revoking");
        assert_eq!(GroupState::Stable.as_str(), "Stable");
    }
}
