//! # Controller Configuration
//!
//! Unified configuration for the detector listener, the state machines and
//! the scheduler. Every field has a default; a TOML file and environment
//! variables override them.
//!
//! ```toml
//! [detector]
//! listen_addr = "0.0.0.0:5000"
//!
//! [topology]
//! segment_count = 2
//! zone_capacity = 8
//! lanes = [{ lane = 1, segment = 1 }, { lane = 2, segment = 1 }]
//!
//! [segment_timing]
//! min_green_secs = 15
//! ```

use lg_01_detector_protocol::ConnectionConfig;
use lg_02_vehicle_classifier::{LaneMap, PlateRules};
use lg_05_segment_control::SegmentConfig;
use lg_06_system_control::SystemConfig;
use serde::{Deserialize, Serialize};
use shared_types::{LaneIndex, SegmentId, STATISTICS_ONLY_SEGMENT};
use std::time::Duration;
use thiserror::Error;

/// Complete controller configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub detector: DetectorConfig,
    pub segment_timing: SegmentTimingConfig,
    pub system_timing: SystemTimingConfig,
    pub topology: TopologyConfig,
    pub plates: PlateRules,
    pub scheduler: SchedulerConfig,
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid value {value:?} for {var}")]
    Env { var: &'static str, value: String },

    #[error("At least one segment is required")]
    NoSegments,

    #[error("Meeting zone capacity must be positive")]
    ZeroZoneCapacity,

    #[error("Timer tick interval must be positive")]
    ZeroTickInterval,

    #[error("Scheduler queue capacity must be positive")]
    ZeroQueueCapacity,

    #[error("min_green ({min_green_secs}s) exceeds max_green ({max_green_secs}s)")]
    GreenBounds {
        min_green_secs: u64,
        max_green_secs: u64,
    },

    #[error("Transition timeout multiplier {0} must be finite and at least 1")]
    TimeoutMultiplier(f64),

    #[error("Lane {lane} is bound to undeclared segment {segment}")]
    LaneSegment { lane: LaneIndex, segment: SegmentId },
}

/// Detector listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub listen_addr: String,
    /// Silence after which a detector connection is closed
    pub read_timeout_secs: u64,
    pub read_buffer_size: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:5000".to_string(),
            read_timeout_secs: 30,
            read_buffer_size: 1024,
        }
    }
}

/// Per-segment timing, shared by every segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentTimingConfig {
    pub min_green_secs: u64,
    pub max_green_secs: u64,
    pub max_red_secs: u64,
    pub conservative_clear_secs: u64,
    pub error_escalation_threshold: u32,
}

impl Default for SegmentTimingConfig {
    fn default() -> Self {
        let defaults = SegmentConfig::default();
        Self {
            min_green_secs: defaults.min_green.as_secs(),
            max_green_secs: defaults.max_green.as_secs(),
            max_red_secs: defaults.max_red.as_secs(),
            conservative_clear_secs: defaults.conservative_clear.as_secs(),
            error_escalation_threshold: defaults.error_escalation_threshold,
        }
    }
}

/// System-level timing and recovery thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemTimingConfig {
    pub min_init_delay_secs: u64,
    pub transition_duration_secs: u64,
    pub transition_timeout_multiplier: f64,
    pub stable_operation_secs: u64,
    pub error_window_secs: u64,
    pub error_threshold: u32,
    pub recovery_health_threshold: u8,
}

impl Default for SystemTimingConfig {
    fn default() -> Self {
        let defaults = SystemConfig::default();
        Self {
            min_init_delay_secs: defaults.min_init_delay.as_secs(),
            transition_duration_secs: defaults.transition_duration.as_secs(),
            transition_timeout_multiplier: defaults.transition_timeout_multiplier,
            stable_operation_secs: defaults.stable_operation_time.as_secs(),
            error_window_secs: defaults.error_window.as_secs(),
            error_threshold: defaults.error_threshold,
            recovery_health_threshold: defaults.recovery_health_threshold,
        }
    }
}

/// One detector lane bound to a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneBinding {
    pub lane: LaneIndex,
    /// `0` marks a statistics-only lane
    pub segment: SegmentId,
}

/// Segments, meeting zones and lane wiring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    /// Segments are numbered `1..=segment_count`; each owns the meeting
    /// zone with the same id.
    pub segment_count: u16,
    pub zone_capacity: usize,
    /// Explicit lane bindings. Empty means lanes `2k-1` and `2k` belong to
    /// segment `k`.
    pub lanes: Vec<LaneBinding>,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            segment_count: 1,
            zone_capacity: 10,
            lanes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub tick_ms: u64,
    /// Bound of each actor's normal queue
    pub queue_capacity: usize,
    pub bus_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_ms: 1000,
            queue_capacity: 256,
            bus_capacity: shared_bus::DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl SignalConfig {
    /// Check the cross-field constraints the state machines rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let topology = &self.topology;
        if topology.segment_count == 0 {
            return Err(ConfigError::NoSegments);
        }
        if topology.zone_capacity == 0 {
            return Err(ConfigError::ZeroZoneCapacity);
        }
        if self.scheduler.tick_ms == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        if self.scheduler.queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }

        let timing = &self.segment_timing;
        if timing.min_green_secs > timing.max_green_secs {
            return Err(ConfigError::GreenBounds {
                min_green_secs: timing.min_green_secs,
                max_green_secs: timing.max_green_secs,
            });
        }

        let multiplier = self.system_timing.transition_timeout_multiplier;
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(ConfigError::TimeoutMultiplier(multiplier));
        }

        if let Some(binding) = topology.lanes.iter().find(|b| {
            b.segment != STATISTICS_ONLY_SEGMENT && b.segment > topology.segment_count
        }) {
            return Err(ConfigError::LaneSegment {
                lane: binding.lane,
                segment: binding.segment,
            });
        }
        Ok(())
    }

    /// Apply `LG_*` overrides read through `lookup`.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `LG_LISTEN_ADDR` | `detector.listen_addr` |
    /// | `LG_SEGMENT_COUNT` | `topology.segment_count` |
    /// | `LG_ZONE_CAPACITY` | `topology.zone_capacity` |
    /// | `LG_TICK_MS` | `scheduler.tick_ms` |
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("LG_LISTEN_ADDR") {
            self.detector.listen_addr = addr;
        }
        if let Some(value) = lookup("LG_SEGMENT_COUNT") {
            self.topology.segment_count = parse_env("LG_SEGMENT_COUNT", value)?;
        }
        if let Some(value) = lookup("LG_ZONE_CAPACITY") {
            self.topology.zone_capacity = parse_env("LG_ZONE_CAPACITY", value)?;
        }
        if let Some(value) = lookup("LG_TICK_MS") {
            self.scheduler.tick_ms = parse_env("LG_TICK_MS", value)?;
        }
        Ok(())
    }

    pub fn segment_ids(&self) -> Vec<SegmentId> {
        (1..=self.topology.segment_count).collect()
    }

    pub fn lane_map(&self) -> LaneMap {
        if self.topology.lanes.is_empty() {
            return LaneMap::sequential(self.topology.segment_count);
        }
        let mut map = LaneMap::new();
        for binding in &self.topology.lanes {
            map.bind(binding.lane, binding.segment);
        }
        map
    }

    pub fn segment_config(&self) -> SegmentConfig {
        let t = &self.segment_timing;
        SegmentConfig {
            min_green: Duration::from_secs(t.min_green_secs),
            max_green: Duration::from_secs(t.max_green_secs),
            max_red: Duration::from_secs(t.max_red_secs),
            conservative_clear: Duration::from_secs(t.conservative_clear_secs),
            error_escalation_threshold: t.error_escalation_threshold,
        }
    }

    pub fn system_config(&self) -> SystemConfig {
        let t = &self.system_timing;
        SystemConfig {
            min_init_delay: Duration::from_secs(t.min_init_delay_secs),
            transition_duration: Duration::from_secs(t.transition_duration_secs),
            transition_timeout_multiplier: t.transition_timeout_multiplier,
            stable_operation_time: Duration::from_secs(t.stable_operation_secs),
            error_window: Duration::from_secs(t.error_window_secs),
            error_threshold: t.error_threshold,
            recovery_health_threshold: t.recovery_health_threshold,
        }
    }

    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            read_timeout: Duration::from_secs(self.detector.read_timeout_secs),
            read_buffer_size: self.detector.read_buffer_size.max(1),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.scheduler.tick_ms)
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { var, value })
}
