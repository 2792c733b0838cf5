//! Segment transition table
//!
//! ```text
//!                 ┌──────── HoldAllRed ─────────┐
//!                 ↓                             │
//! [UPSTREAM_GREEN] ──green guard──→ [ALL_RED_CLEAR] ←──green guard── [DOWNSTREAM_GREEN]
//!                 ↑                   │       │                        ↑
//!                 └── clear verdict ──┘       └──── clear verdict ─────┘
//!
//! any ──ManualYellowFlash──→ [YELLOW_FLASH_MANUAL] ──HoldAllRed──→ [ALL_RED_CLEAR]
//! any ──ReleaseControl─────→ [NO_CTRL]             ──HoldAllRed──→ [ALL_RED_CLEAR]
//! any ──SystemReset────────→ [ALL_RED_CLEAR] (held, counters cleared)
//! ```
//!
//! Greens never follow each other directly, so two conflicting greens cannot
//! be represented.

use super::config::SegmentConfig;
use shared_types::{SegmentEvent, SegmentState, Side};
use std::time::Duration;

/// Inputs of the guard for leaving a green state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GreenGuard {
    pub elapsed: Duration,
    /// Vehicles wait on the opposite side, or a switch was requested
    pub opposing_request: bool,
    /// Vehicles of the green direction are still inside
    pub current_flow: bool,
    /// Max green reported by a timer event
    pub max_green_reached: bool,
}

/// Whether a green phase may end.
///
/// `elapsed ≥ min_green ∧ opposing_request ∧ (¬current_flow ∨ elapsed ≥ max_green)`
pub fn may_leave_green(config: &SegmentConfig, guard: &GreenGuard) -> bool {
    let max_green = guard.max_green_reached || guard.elapsed >= config.max_green;
    guard.elapsed >= config.min_green && guard.opposing_request && (!guard.current_flow || max_green)
}

/// Direction to grant after all-red.
///
/// Alternates unless only the direction that was last green has demand.
pub fn choose_green_side(last_green: Side, demand: impl Fn(Side) -> bool) -> Side {
    let other = last_green.opposite();
    if !demand(other) && demand(last_green) {
        last_green
    } else {
        other
    }
}

/// Target state of a supervisory command, `None` for non-commands.
///
/// `ResumeInductive` only releases a hold and never changes state.
pub fn command_target(current: SegmentState, command: SegmentEvent) -> Option<SegmentState> {
    match command {
        SegmentEvent::HoldAllRed | SegmentEvent::SystemReset => Some(SegmentState::AllRedClear),
        SegmentEvent::ManualYellowFlash => Some(SegmentState::YellowFlashManual),
        SegmentEvent::ReleaseControl => Some(SegmentState::NoCtrl),
        SegmentEvent::ResumeInductive => Some(current),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SegmentConfig {
        SegmentConfig {
            min_green: Duration::from_secs(10),
            max_green: Duration::from_secs(60),
            ..Default::default()
        }
    }

    fn guard(secs: u64, opposing_request: bool, current_flow: bool) -> GreenGuard {
        GreenGuard {
            elapsed: Duration::from_secs(secs),
            opposing_request,
            current_flow,
            max_green_reached: false,
        }
    }

    #[test]
    fn test_min_green_holds() {
        assert!(!may_leave_green(&config(), &guard(9, true, false)));
        assert!(may_leave_green(&config(), &guard(10, true, false)));
    }

    #[test]
    fn test_no_request_keeps_green() {
        assert!(!may_leave_green(&config(), &guard(600, false, false)));
    }

    #[test]
    fn test_flow_keeps_green_until_max() {
        assert!(!may_leave_green(&config(), &guard(30, true, true)));
        assert!(may_leave_green(&config(), &guard(60, true, true)));

        let mut timed_out = guard(30, true, true);
        timed_out.max_green_reached = true;
        assert!(may_leave_green(&config(), &timed_out));
    }

    #[test]
    fn test_choose_green_side() {
        // Alternates by default
        assert_eq!(choose_green_side(Side::Downstream, |_| false), Side::Upstream);
        assert_eq!(choose_green_side(Side::Upstream, |_| true), Side::Downstream);
        // Stays when only the last side has demand
        assert_eq!(
            choose_green_side(Side::Upstream, |s| s == Side::Upstream),
            Side::Upstream
        );
    }

    #[test]
    fn test_command_targets() {
        let green = SegmentState::UpstreamGreen;
        assert_eq!(
            command_target(green, SegmentEvent::HoldAllRed),
            Some(SegmentState::AllRedClear)
        );
        assert_eq!(
            command_target(green, SegmentEvent::ManualYellowFlash),
            Some(SegmentState::YellowFlashManual)
        );
        assert_eq!(
            command_target(green, SegmentEvent::ReleaseControl),
            Some(SegmentState::NoCtrl)
        );
        assert_eq!(command_target(green, SegmentEvent::ResumeInductive), Some(green));
        assert_eq!(command_target(green, SegmentEvent::TimerTick), None);
    }
}
