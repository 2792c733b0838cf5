//! # Segment Events
//!
//! Events consumed by the per-segment state machine. Vehicle events come from
//! the classifier; timer, fault and supervisory events from the runtime and
//! the system state machine.
//!
//! Each event kind has a fixed [`EventPriority`]. `Critical` events are
//! processed synchronously by the scheduler; everything else is queued FIFO
//! per segment.

use crate::entities::{PlateId, SegmentId, Side};
use serde::{Deserialize, Serialize};

/// Scheduling priority of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventPriority {
    Low,
    Normal,
    High,
    Critical,
}

impl EventPriority {
    #[must_use]
    pub fn is_critical(self) -> bool {
        matches!(self, Self::Critical)
    }
}

/// Whether a vehicle event is an entry into or an exit out of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Movement {
    Enter,
    Exit,
}

/// Every event a segment state machine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegmentEvent {
    // =========================================================================
    // VEHICLE EVENTS (from the classifier)
    // =========================================================================
    VehicleEnterUpstream,
    VehicleExitUpstream,
    VehicleEnterDownstream,
    VehicleExitDownstream,

    // =========================================================================
    // TIMERS
    // =========================================================================
    /// Periodic evaluation tick.
    TimerTick,
    /// Maximum green reached for the current direction.
    GreenTimeout,
    /// Maximum all-red clearing time exceeded.
    ClearTimeout,
    /// Conservative-clear duration elapsed, force clearance now.
    ConservativeClearTriggered,

    // =========================================================================
    // SENSORS
    // =========================================================================
    SensorFault,
    SensorRecovered,

    // =========================================================================
    // SUPERVISORY COMMANDS
    // =========================================================================
    /// Operator request to hand right-of-way to the other direction.
    ForceSwitch,
    /// Enter (or stay in) all-red and stop granting green.
    HoldAllRed,
    /// Release an all-red hold and resume detector-driven operation.
    ResumeInductive,
    /// Switch to flashing yellow (manual / degraded operation).
    ManualYellowFlash,
    /// Hand the segment over to external control (signals dark).
    ReleaseControl,
    /// Wipe all counters, vehicle sets and zones; restart held in all-red.
    SystemReset,
}

impl SegmentEvent {
    /// Scheduling priority of this event kind.
    #[must_use]
    pub fn priority(self) -> EventPriority {
        match self {
            Self::TimerTick => EventPriority::Low,
            Self::VehicleEnterUpstream
            | Self::VehicleExitUpstream
            | Self::VehicleEnterDownstream
            | Self::VehicleExitDownstream
            | Self::SensorRecovered => EventPriority::Normal,
            Self::GreenTimeout
            | Self::ClearTimeout
            | Self::ConservativeClearTriggered
            | Self::SensorFault
            | Self::ForceSwitch => EventPriority::High,
            Self::HoldAllRed
            | Self::ResumeInductive
            | Self::ManualYellowFlash
            | Self::ReleaseControl
            | Self::SystemReset => EventPriority::Critical,
        }
    }

    /// Short label for logs and metrics.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::VehicleEnterUpstream => "vehicle_enter_upstream",
            Self::VehicleExitUpstream => "vehicle_exit_upstream",
            Self::VehicleEnterDownstream => "vehicle_enter_downstream",
            Self::VehicleExitDownstream => "vehicle_exit_downstream",
            Self::TimerTick => "timer_tick",
            Self::GreenTimeout => "green_timeout",
            Self::ClearTimeout => "clear_timeout",
            Self::ConservativeClearTriggered => "conservative_clear_triggered",
            Self::SensorFault => "sensor_fault",
            Self::SensorRecovered => "sensor_recovered",
            Self::ForceSwitch => "force_switch",
            Self::HoldAllRed => "hold_all_red",
            Self::ResumeInductive => "resume_inductive",
            Self::ManualYellowFlash => "manual_yellow_flash",
            Self::ReleaseControl => "release_control",
            Self::SystemReset => "system_reset",
        }
    }

    /// Build the vehicle event for a movement on a side.
    #[must_use]
    pub fn vehicle(side: Side, movement: Movement) -> Self {
        match (side, movement) {
            (Side::Upstream, Movement::Enter) => Self::VehicleEnterUpstream,
            (Side::Upstream, Movement::Exit) => Self::VehicleExitUpstream,
            (Side::Downstream, Movement::Enter) => Self::VehicleEnterDownstream,
            (Side::Downstream, Movement::Exit) => Self::VehicleExitDownstream,
        }
    }

    /// Side and movement of a vehicle event, `None` for every other kind.
    #[must_use]
    pub fn vehicle_movement(self) -> Option<(Side, Movement)> {
        match self {
            Self::VehicleEnterUpstream => Some((Side::Upstream, Movement::Enter)),
            Self::VehicleExitUpstream => Some((Side::Upstream, Movement::Exit)),
            Self::VehicleEnterDownstream => Some((Side::Downstream, Movement::Enter)),
            Self::VehicleExitDownstream => Some((Side::Downstream, Movement::Exit)),
            _ => None,
        }
    }
}

/// Immutable data attached to a segment event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPayload {
    /// Target segment.
    pub segment_id: SegmentId,
    /// Vehicle plate for vehicle events.
    pub plate: Option<PlateId>,
    /// Sensor identifier for sensor events.
    pub sensor_id: Option<String>,
}

impl EventPayload {
    /// Payload that carries only the segment.
    #[must_use]
    pub fn for_segment(segment_id: SegmentId) -> Self {
        Self {
            segment_id,
            plate: None,
            sensor_id: None,
        }
    }

    /// Payload for a vehicle event.
    #[must_use]
    pub fn vehicle(segment_id: SegmentId, plate: PlateId) -> Self {
        Self {
            segment_id,
            plate: Some(plate),
            sensor_id: None,
        }
    }

    /// Payload for a sensor event.
    pub fn sensor(segment_id: SegmentId, sensor_id: impl Into<String>) -> Self {
        Self {
            segment_id,
            plate: None,
            sensor_id: Some(sensor_id.into()),
        }
    }
}
