//! Outputs of the segment state machine

use lg_04_clearance::ClearanceEvaluation;
use serde::Serialize;
use shared_types::{SegmentId, SegmentState};
use std::fmt;
use std::time::Duration;

/// Why a segment raised a fault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SegmentFaultReason {
    /// All-red lasted beyond the maximum red time without clearance
    MaxRedExceeded { waited: Duration },
    /// ID logic errors reached the escalation threshold
    ConsecutiveLogicErrors { count: u32 },
}

impl fmt::Display for SegmentFaultReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxRedExceeded { waited } => {
                write!(f, "all-red held {}s without clearance", waited.as_secs())
            }
            Self::ConsecutiveLogicErrors { count } => {
                write!(f, "{count} consecutive vehicle ID logic errors")
            }
        }
    }
}

/// Something the rest of the system must learn about
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SegmentNotification {
    StateChanged {
        segment_id: SegmentId,
        from: SegmentState,
        to: SegmentState,
    },
    /// Emitted when the verdict or the forced-clear flag changes
    ClearanceEvaluated {
        segment_id: SegmentId,
        evaluation: ClearanceEvaluation,
    },
    Fault {
        segment_id: SegmentId,
        reason: SegmentFaultReason,
    },
}

impl SegmentNotification {
    pub fn segment_id(&self) -> SegmentId {
        match self {
            Self::StateChanged { segment_id, .. }
            | Self::ClearanceEvaluated { segment_id, .. }
            | Self::Fault { segment_id, .. } => *segment_id,
        }
    }

    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Fault { .. })
    }
}
