//! Segment timing configuration

use std::time::Duration;

/// Timing and escalation parameters of one segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentConfig {
    /// Minimum time a direction keeps green once granted
    pub min_green: Duration,
    /// Green time after which flow in the current direction no longer
    /// blocks an opposing request
    pub max_green: Duration,
    /// All-red time after which the segment reports a fault
    pub max_red: Duration,
    /// Time a conservative verdict may persist before a forced clear
    pub conservative_clear: Duration,
    /// Consecutive ID logic errors that raise a fault
    pub error_escalation_threshold: u32,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            min_green: Duration::from_secs(10),
            max_green: Duration::from_secs(60),
            max_red: Duration::from_secs(120),
            conservative_clear: Duration::from_secs(30),
            error_escalation_threshold: 5,
        }
    }
}

/// Health score adjustments, applied with saturation to `[0, 100]`
pub mod health {
    pub const MAX: u8 = 100;
    pub const ID_LOGIC_ERROR: i16 = -5;
    pub const FORCED_CLEAR: i16 = -10;
    pub const MAX_RED_FAULT: i16 = -20;
    pub const CLEAN_CLEARANCE: i16 = 2;

    /// Apply a delta to a health score.
    pub fn adjust(score: u8, delta: i16) -> u8 {
        (i16::from(score) + delta).clamp(0, i16::from(MAX)) as u8
    }

}
