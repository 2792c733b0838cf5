//! # Signal States
//!
//! State vocabulary of the two state-machine layers and the clearance verdict
//! that links them.

use crate::entities::Side;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Aspect shown by one direction's signal head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalAspect {
    Green,
    Red,
    FlashingYellow,
    Dark,
}

/// State of a segment's signal pair.
///
/// The green variants name exactly one direction, so two conflicting greens
/// cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegmentState {
    UpstreamGreen,
    DownstreamGreen,
    AllRedClear,
    YellowFlashManual,
    NoCtrl,
}

impl SegmentState {
    /// The green state for a side.
    #[must_use]
    pub fn green_for(side: Side) -> Self {
        match side {
            Side::Upstream => Self::UpstreamGreen,
            Side::Downstream => Self::DownstreamGreen,
        }
    }

    /// The side holding right-of-way, if any.
    #[must_use]
    pub fn green_side(self) -> Option<Side> {
        match self {
            Self::UpstreamGreen => Some(Side::Upstream),
            Self::DownstreamGreen => Some(Side::Downstream),
            _ => None,
        }
    }

    /// Externally controlled states that only a supervisory command leaves.
    #[must_use]
    pub fn is_manual(self) -> bool {
        matches!(self, Self::YellowFlashManual | Self::NoCtrl)
    }

    /// Aspect displayed to a side in this state.
    #[must_use]
    pub fn aspect_for(self, side: Side) -> SignalAspect {
        match self {
            Self::YellowFlashManual => SignalAspect::FlashingYellow,
            Self::NoCtrl => SignalAspect::Dark,
            state if state.green_side() == Some(side) => SignalAspect::Green,
            _ => SignalAspect::Red,
        }
    }
}

impl fmt::Display for SegmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UpstreamGreen => "UPSTREAM_GREEN",
            Self::DownstreamGreen => "DOWNSTREAM_GREEN",
            Self::AllRedClear => "ALL_RED_CLEAR",
            Self::YellowFlashManual => "YELLOW_FLASH_MANUAL",
            Self::NoCtrl => "NO_CTRL",
        };
        f.write_str(name)
    }
}

/// Safety verdict on switching right-of-way.
///
/// Declaration order is the safety order: `Wait < Conservative < Warning < Safe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClearanceDecision {
    /// Evidence of a vehicle still inside the segment.
    Wait,
    /// Evidence is inconsistent; only a timed fallback may clear.
    Conservative,
    /// Clear, with reduced confidence.
    Warning,
    /// Clear.
    Safe,
}

impl ClearanceDecision {
    /// Whether right-of-way may be switched on this verdict alone.
    #[must_use]
    pub fn is_clear(self) -> bool {
        matches!(self, Self::Safe | Self::Warning)
    }
}

impl fmt::Display for ClearanceDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Wait => "WAIT",
            Self::Conservative => "CONSERVATIVE",
            Self::Warning => "WARNING",
            Self::Safe => "SAFE",
        };
        f.write_str(name)
    }
}

/// Aggregate operating mode of the whole installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemState {
    SystemInit,
    AllRedTransition,
    InductiveMode,
    DegradedMode,
    MaintenanceMode,
    EmergencyMode,
}

impl SystemState {
    /// States that only `SystemReset` leaves.
    #[must_use]
    pub fn requires_reset(self) -> bool {
        matches!(self, Self::MaintenanceMode | Self::EmergencyMode)
    }
}

impl fmt::Display for SystemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SystemInit => "SYSTEM_INIT",
            Self::AllRedTransition => "ALL_RED_TRANSITION",
            Self::InductiveMode => "INDUCTIVE_MODE",
            Self::DegradedMode => "DEGRADED_MODE",
            Self::MaintenanceMode => "MAINTENANCE_MODE",
            Self::EmergencyMode => "EMERGENCY_MODE",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_safety_order() {
        assert!(ClearanceDecision::Wait < ClearanceDecision::Conservative);
        assert!(ClearanceDecision::Conservative < ClearanceDecision::Warning);
        assert!(ClearanceDecision::Warning < ClearanceDecision::Safe);
    }

    #[test]
    fn test_at_most_one_green_aspect() {
        for state in [
            SegmentState::UpstreamGreen,
            SegmentState::DownstreamGreen,
            SegmentState::AllRedClear,
            SegmentState::YellowFlashManual,
            SegmentState::NoCtrl,
        ] {
            let greens = Side::BOTH
                .iter()
                .filter(|side| state.aspect_for(**side) == SignalAspect::Green)
                .count();
            assert!(greens <= 1, "{state} shows {greens} greens");
        }
    }

    #[test]
    fn test_green_side_roundtrip() {
        for side in Side::BOTH {
            assert_eq!(SegmentState::green_for(side).green_side(), Some(side));
        }
        assert_eq!(SegmentState::AllRedClear.green_side(), None);
    }
}
