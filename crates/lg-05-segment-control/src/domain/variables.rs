//! Per-segment mutable state

use super::config::health;
use lg_04_clearance::DirectionView;
use serde::{Deserialize, Serialize};
use shared_types::{ClearanceDecision, PlateId, SegmentId, SegmentState, Side};
use std::collections::{BTreeSet, HashSet};
use std::time::Instant;

/// Vehicles of one direction inside the segment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectionFlow {
    pub plates: HashSet<PlateId>,
    pub in_count: u64,
    pub out_count: u64,
}

impl DirectionFlow {
    /// Admit a vehicle. A plate already inside is not counted twice.
    pub fn admit(&mut self, plate: PlateId) -> bool {
        let inserted = self.plates.insert(plate);
        if inserted {
            self.in_count += 1;
        }
        inserted
    }

    /// Record an exit. Returns `false` if the plate was never admitted.
    pub fn release(&mut self, plate: &PlateId) -> bool {
        let removed = self.plates.remove(plate);
        if removed {
            self.out_count += 1;
        }
        removed
    }

    pub fn view(&self) -> DirectionView {
        DirectionView::new(self.plates.len(), self.in_count, self.out_count)
    }

    /// Empty the set and balance the counters.
    ///
    /// Returns the number of inconsistencies discarded.
    pub fn reconcile(&mut self) -> u64 {
        let stranded = self.plates.len() as u64;
        let discrepancy = stranded.max(self.in_count.abs_diff(self.out_count));
        self.plates.clear();
        self.out_count = self.in_count;
        discrepancy
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Everything a segment state machine owns
#[derive(Debug, Clone)]
pub struct SegmentVariables {
    pub current_state: SegmentState,
    pub phase_start: Instant,
    pub upstream: DirectionFlow,
    pub downstream: DirectionFlow,
    pub health_score: u8,
    pub consecutive_errors: u32,
    /// Total ID logic errors since reset
    pub id_logic_errors: u64,
    /// Sensors currently reported faulted
    pub faulted_sensors: BTreeSet<String>,
    /// Vehicles that found their meeting area full. They request
    /// right-of-way like queued vehicles and are admitted on grant.
    pub upstream_overflow: BTreeSet<PlateId>,
    pub downstream_overflow: BTreeSet<PlateId>,
    /// All-red is being held by supervisory command
    pub hold: bool,
    /// Direction that held green most recently
    pub last_green: Side,
    /// Direction whose late entries are still admitted during all-red
    pub late_admission: Option<Side>,
    pub pending_force_switch: bool,
    /// A max-red fault was raised in the current all-red phase
    pub max_red_fault_raised: bool,
    pub last_decision: Option<ClearanceDecision>,
    pub last_force_clear: bool,
}

impl SegmentVariables {
    pub fn new(now: Instant) -> Self {
        Self {
            current_state: SegmentState::AllRedClear,
            phase_start: now,
            upstream: DirectionFlow::default(),
            downstream: DirectionFlow::default(),
            health_score: health::MAX,
            consecutive_errors: 0,
            id_logic_errors: 0,
            faulted_sensors: BTreeSet::new(),
            upstream_overflow: BTreeSet::new(),
            downstream_overflow: BTreeSet::new(),
            hold: true,
            last_green: Side::Downstream,
            late_admission: None,
            pending_force_switch: false,
            max_red_fault_raised: false,
            last_decision: None,
            last_force_clear: false,
        }
    }

    pub fn flow(&self, side: Side) -> &DirectionFlow {
        match side {
            Side::Upstream => &self.upstream,
            Side::Downstream => &self.downstream,
        }
    }

    pub fn flow_mut(&mut self, side: Side) -> &mut DirectionFlow {
        match side {
            Side::Upstream => &mut self.upstream,
            Side::Downstream => &mut self.downstream,
        }
    }

    pub fn overflow(&self, side: Side) -> &BTreeSet<PlateId> {
        match side {
            Side::Upstream => &self.upstream_overflow,
            Side::Downstream => &self.downstream_overflow,
        }
    }

    pub fn overflow_mut(&mut self, side: Side) -> &mut BTreeSet<PlateId> {
        match side {
            Side::Upstream => &mut self.upstream_overflow,
            Side::Downstream => &mut self.downstream_overflow,
        }
    }

    pub fn adjust_health(&mut self, delta: i16) {
        self.health_score = health::adjust(self.health_score, delta);
    }

    pub fn any_sensor_faulted(&self) -> bool {
        !self.faulted_sensors.is_empty()
    }
}

/// Direction part of [`SegmentSnapshot`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionSnapshot {
    pub vehicles: Vec<PlateId>,
    pub in_count: u64,
    pub out_count: u64,
    /// Vehicles queued in the meeting area
    pub waiting: usize,
}

/// Read-only view of a segment for status publishing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentSnapshot {
    pub segment_id: SegmentId,
    pub state: SegmentState,
    pub hold: bool,
    pub phase_elapsed_ms: u64,
    pub upstream: DirectionSnapshot,
    pub downstream: DirectionSnapshot,
    pub health_score: u8,
    pub consecutive_errors: u32,
    pub id_logic_errors: u64,
    pub last_decision: Option<ClearanceDecision>,
    pub faulted_sensors: Vec<String>,
}

impl SegmentSnapshot {
    /// Whether the last clearance evaluation allowed a switch.
    pub fn is_cleared(&self) -> bool {
        self.last_decision.is_some_and(ClearanceDecision::is_clear)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admit_does_not_double_count() {
        let mut flow = DirectionFlow::default();
        assert!(flow.admit("A1".into()));
        assert!(!flow.admit("A1".into()));
        assert_eq!(flow.in_count, 1);
    }

    #[test]
    fn test_release_unknown_plate() {
        let mut flow = DirectionFlow::default();
        flow.admit("A1".into());
        assert!(!flow.release(&"B2".into()));
        assert!(flow.release(&"A1".into()));
        assert!(!flow.release(&"A1".into()));
        assert_eq!((flow.in_count, flow.out_count), (1, 1));
    }

    #[test]
    fn test_reconcile_counts_discrepancy() {
        let mut flow = DirectionFlow::default();
        flow.admit("A1".into());
        flow.admit("B2".into());
        flow.in_count += 1;
        // 2 stranded plates, counters off by 3
        assert_eq!(flow.reconcile(), 3);
        assert!(flow.plates.is_empty());
        assert_eq!(flow.in_count, flow.out_count);
        assert_eq!(flow.reconcile(), 0);
    }
}
