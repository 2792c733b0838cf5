//! System events and the commands they fan out to segments

use serde::{Deserialize, Serialize};
use shared_types::{EventPriority, SegmentEvent, SegmentId, SystemState};

/// Events driving the top-level state machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemEvent {
    // Startup guards
    SelfCheckPassed,
    ConfigurationLoaded,

    TimerTick,

    // From segments
    SegmentClearance { segment: SegmentId, cleared: bool },
    SegmentFault { segment: SegmentId, reason: String },

    // Faults and supervisory requests
    FaultDetected { source: String },
    CriticalFault { source: String },
    ManualDegrade,
    ManualEmergency,
    MaintenanceRequest,
    ConditionsRestored,

    // Infrastructure
    CommunicationLost,
    CommunicationRestored,
    PowerLost,
    PowerRestored,

    SystemReset,
}

impl SystemEvent {
    pub fn priority(&self) -> EventPriority {
        match self {
            Self::SystemReset | Self::CriticalFault { .. } | Self::ManualEmergency => {
                EventPriority::Critical
            }
            Self::SegmentFault { .. }
            | Self::FaultDetected { .. }
            | Self::CommunicationLost
            | Self::PowerLost
            | Self::ManualDegrade
            | Self::MaintenanceRequest => EventPriority::High,
            Self::TimerTick => EventPriority::Low,
            _ => EventPriority::Normal,
        }
    }

    /// Short label for logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelfCheckPassed => "self_check_passed",
            Self::ConfigurationLoaded => "configuration_loaded",
            Self::TimerTick => "timer_tick",
            Self::SegmentClearance { .. } => "segment_clearance",
            Self::SegmentFault { .. } => "segment_fault",
            Self::FaultDetected { .. } => "fault_detected",
            Self::CriticalFault { .. } => "critical_fault",
            Self::ManualDegrade => "manual_degrade",
            Self::ManualEmergency => "manual_emergency",
            Self::MaintenanceRequest => "maintenance_request",
            Self::ConditionsRestored => "conditions_restored",
            Self::CommunicationLost => "communication_lost",
            Self::CommunicationRestored => "communication_restored",
            Self::PowerLost => "power_lost",
            Self::PowerRestored => "power_restored",
            Self::SystemReset => "system_reset",
        }
    }
}

/// Command sent to every segment after a system transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentCommand {
    HoldAllRed,
    ResumeInductive,
    ManualYellowFlash,
    ReleaseControl,
    /// Clear counters and zones, then hold all-red
    Reset,
}

impl SegmentCommand {
    /// Command implied by entering `state`.
    pub fn for_state(state: SystemState) -> Self {
        match state {
            SystemState::SystemInit
            | SystemState::AllRedTransition
            | SystemState::EmergencyMode => Self::HoldAllRed,
            SystemState::InductiveMode => Self::ResumeInductive,
            SystemState::DegradedMode => Self::ManualYellowFlash,
            SystemState::MaintenanceMode => Self::ReleaseControl,
        }
    }

    pub fn segment_event(self) -> SegmentEvent {
        match self {
            Self::HoldAllRed => SegmentEvent::HoldAllRed,
            Self::ResumeInductive => SegmentEvent::ResumeInductive,
            Self::ManualYellowFlash => SegmentEvent::ManualYellowFlash,
            Self::ReleaseControl => SegmentEvent::ReleaseControl,
            Self::Reset => SegmentEvent::SystemReset,
        }
    }
}

/// Result of a state-changing event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemTransition {
    pub from: SystemState,
    pub to: SystemState,
    pub command: SegmentCommand,
}
