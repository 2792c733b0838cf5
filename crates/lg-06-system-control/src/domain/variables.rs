//! System-wide mutable state

use super::config::health;
use serde::{Deserialize, Serialize};
use shared_types::{SegmentId, SystemState};
use std::collections::{BTreeMap, VecDeque};
use std::time::{Duration, Instant};

/// Most recent fault
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultRecord {
    pub at: Instant,
    pub source: String,
}

#[derive(Debug, Clone)]
pub struct SystemVariables {
    pub current_state: SystemState,
    pub state_entered: Instant,
    pub health_score: u8,
    pub self_check_passed: bool,
    pub configuration_loaded: bool,
    pub communication_ok: bool,
    pub power_ok: bool,
    pub last_fault: Option<FaultRecord>,
    /// Error times, oldest first
    pub errors: VecDeque<Instant>,
    /// Last reported clearance per segment
    pub segment_clearance: BTreeMap<SegmentId, bool>,
    pub transitions: u64,
}

impl SystemVariables {
    pub fn new(segments: &[SegmentId], now: Instant) -> Self {
        Self {
            current_state: SystemState::SystemInit,
            state_entered: now,
            health_score: health::MAX,
            self_check_passed: false,
            configuration_loaded: false,
            communication_ok: true,
            power_ok: true,
            last_fault: None,
            errors: VecDeque::new(),
            segment_clearance: segments.iter().map(|&id| (id, false)).collect(),
            transitions: 0,
        }
    }

    pub fn elapsed_in_state(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.state_entered)
    }

    pub fn all_segments_cleared(&self) -> bool {
        self.segment_clearance.values().all(|&cleared| cleared)
    }

    /// Drop errors older than `window` and return how many remain.
    pub fn errors_in_window(&mut self, window: Duration, now: Instant) -> usize {
        while self
            .errors
            .front()
            .is_some_and(|&at| now.saturating_duration_since(at) > window)
        {
            self.errors.pop_front();
        }
        self.errors.len()
    }

    /// Time since the last fault; `None` if there never was one.
    pub fn fault_age(&self, now: Instant) -> Option<Duration> {
        self.last_fault
            .as_ref()
            .map(|fault| now.saturating_duration_since(fault.at))
    }

    pub fn adjust_health(&mut self, delta: i16) {
        self.health_score = health::adjust(self.health_score, delta);
    }
}

/// Read-only view for status publishing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub state: SystemState,
    pub state_elapsed_ms: u64,
    pub health_score: u8,
    pub self_check_passed: bool,
    pub configuration_loaded: bool,
    pub communication_ok: bool,
    pub power_ok: bool,
    pub last_fault_source: Option<String>,
    pub recent_errors: usize,
    pub segment_clearance: BTreeMap<SegmentId, bool>,
    pub transitions: u64,
}
