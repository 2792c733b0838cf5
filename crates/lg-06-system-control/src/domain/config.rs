//! System timing and recovery configuration

use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct SystemConfig {
    /// Minimum time in SystemInit
    pub min_init_delay: Duration,
    /// Minimum all-red transition time
    pub transition_duration: Duration,
    /// All-red transition gives up after `multiplier × transition_duration`
    pub transition_timeout_multiplier: f64,
    /// Fault-free time required before leaving DegradedMode
    pub stable_operation_time: Duration,
    /// Sliding window for counting errors
    pub error_window: Duration,
    /// Errors within the window that block recovery
    pub error_threshold: u32,
    /// Minimum health score for recovery
    pub recovery_health_threshold: u8,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            min_init_delay: Duration::from_secs(5),
            transition_duration: Duration::from_secs(10),
            transition_timeout_multiplier: 3.0,
            stable_operation_time: Duration::from_secs(60),
            error_window: Duration::from_secs(300),
            error_threshold: 5,
            recovery_health_threshold: 60,
        }
    }
}

impl SystemConfig {
    /// Elapsed all-red transition time after which the system degrades.
    ///
    /// Saturates at `Duration::MAX` for products that do not fit.
    pub fn transition_timeout(&self) -> Duration {
        let multiplier = self.transition_timeout_multiplier.max(1.0);
        Duration::try_from_secs_f64(self.transition_duration.as_secs_f64() * multiplier)
            .unwrap_or(Duration::MAX)
    }
}

/// Health score adjustments, applied with saturation to `[0, 100]`
pub mod health {
    use shared_types::SystemState;

    pub const MAX: u8 = 100;
    pub const ERROR: i16 = -5;

    /// Delta applied on entering a state.
    pub fn on_entry(state: SystemState) -> i16 {
        match state {
            SystemState::InductiveMode => 10,
            SystemState::DegradedMode => -20,
            SystemState::EmergencyMode => -40,
            _ => 0,
        }
    }

    pub fn adjust(score: u8, delta: i16) -> u8 {
        (i16::from(score) + delta).clamp(0, i16::from(MAX)) as u8
    }
}
