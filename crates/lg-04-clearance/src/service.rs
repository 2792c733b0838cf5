//! Clearance Engine
//!
//! Couples the verdict functions with the conservative-clear timer. One
//! engine per segment, owned by that segment's state machine.

use crate::domain::{
    apply_sensor_health, combine, decide, ConservativeClearTimer, DirectionView,
};
use serde::Serialize;
use shared_types::ClearanceDecision;
use std::time::{Duration, Instant};
use tracing::debug;

/// Result of one clearance evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClearanceEvaluation {
    pub upstream: ClearanceDecision,
    pub downstream: ClearanceDecision,
    /// Combined verdict after sensor health
    pub decision: ClearanceDecision,
    /// The conservative-clear duration has elapsed
    pub force_clear: bool,
}

impl ClearanceEvaluation {
    /// Whether right-of-way may switch now.
    pub fn permits_switch(&self) -> bool {
        self.decision.is_clear() || self.force_clear
    }
}

#[derive(Debug, Clone)]
pub struct ClearanceEngine {
    timer: ConservativeClearTimer,
}

impl ClearanceEngine {
    pub fn new(conservative_clear: Duration) -> Self {
        Self {
            timer: ConservativeClearTimer::new(conservative_clear),
        }
    }

    /// Evaluate both directions.
    ///
    /// A `Conservative` verdict starts the timer (no-op if running); any other
    /// verdict stops it.
    pub fn evaluate(
        &mut self,
        upstream: &DirectionView,
        downstream: &DirectionView,
        sensor_faulted: bool,
        now: Instant,
    ) -> ClearanceEvaluation {
        let up = decide(upstream);
        let down = decide(downstream);
        let decision = apply_sensor_health(combine(up, down), sensor_faulted);

        let force_clear = if decision == ClearanceDecision::Conservative {
            if self.timer.start(now) {
                debug!(?upstream, ?downstream, "Conservative clear timer started");
            }
            self.timer.should_force(now)
        } else {
            self.timer.stop();
            false
        };

        ClearanceEvaluation {
            upstream: up,
            downstream: down,
            decision,
            force_clear,
        }
    }

    /// Stop the timer, e.g. after a forced clear or on leaving all-red.
    pub fn reset(&mut self) {
        self.timer.stop();
    }

    pub fn timer(&self) -> &ConservativeClearTimer {
        &self.timer
    }
}
