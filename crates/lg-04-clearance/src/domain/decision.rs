//! Clearance verdicts
//!
//! ```text
//! ID set     counters      verdict
//! ─────────  ────────────  ────────────
//! non-empty  |in-out| ≥ 1  Wait
//! empty      in == out     Safe
//! otherwise                Conservative
//! ```

use serde::{Deserialize, Serialize};
use shared_types::ClearanceDecision;

/// Read-only evidence for one direction of a segment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionView {
    /// Plates admitted and not yet seen leaving
    pub vehicles_inside: usize,
    pub in_count: u64,
    pub out_count: u64,
}

impl DirectionView {
    pub fn new(vehicles_inside: usize, in_count: u64, out_count: u64) -> Self {
        Self {
            vehicles_inside,
            in_count,
            out_count,
        }
    }

    pub fn counters_balanced(&self) -> bool {
        self.in_count == self.out_count
    }
}

/// Verdict for a single direction.
///
/// Never returns `Warning`; that verdict only arises from sensor health.
pub fn decide(view: &DirectionView) -> ClearanceDecision {
    let ids_present = view.vehicles_inside > 0;
    if ids_present && view.in_count.abs_diff(view.out_count) >= 1 {
        ClearanceDecision::Wait
    } else if !ids_present && view.counters_balanced() {
        ClearanceDecision::Safe
    } else {
        ClearanceDecision::Conservative
    }
}

/// Overall verdict: the least safe of the two directions.
pub fn combine(upstream: ClearanceDecision, downstream: ClearanceDecision) -> ClearanceDecision {
    use ClearanceDecision::*;
    match (upstream, downstream) {
        (Wait, _) | (_, Wait) => Wait,
        (Conservative, _) | (_, Conservative) => Conservative,
        (Warning, _) | (_, Warning) => Warning,
        (Safe, Safe) => Safe,
    }
}

/// Downgrade `Safe` to `Warning` while any sensor of the segment is faulted.
pub fn apply_sensor_health(decision: ClearanceDecision, sensor_faulted: bool) -> ClearanceDecision {
    match decision {
        ClearanceDecision::Safe if sensor_faulted => ClearanceDecision::Warning,
        other => other,
    }
}
