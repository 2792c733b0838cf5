//! # Component Container
//!
//! Builds the shared components from a validated [`SignalConfig`].
//!
//! ## Construction Order
//!
//! ```text
//! 1. Event bus
//! 2. Meeting-zone registry, one zone per segment
//! 3. Vehicle classifier (lane map + plate rules)
//! 4. Segment and system state machines (on demand, by the scheduler)
//! ```
//!
//! The registry is created here and handed to every segment; nothing holds
//! it globally.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument};

use lg_02_vehicle_classifier::VehicleClassifier;
use lg_03_meeting_zones::{MeetingZoneApi, MeetingZoneRegistry, ZoneError};
use lg_05_segment_control::SegmentStateMachine;
use lg_06_system_control::{SystemResult, SystemStateMachine};
use shared_bus::InMemoryEventBus;

use super::config::SignalConfig;

pub struct SignalContainer {
    pub config: SignalConfig,
    pub zones: Arc<MeetingZoneRegistry>,
    pub classifier: Arc<VehicleClassifier>,
    pub event_bus: Arc<InMemoryEventBus>,
}

impl SignalContainer {
    #[instrument(name = "container_init", skip(config))]
    pub fn new(config: SignalConfig) -> Result<Self, ZoneError> {
        let event_bus = Arc::new(InMemoryEventBus::with_capacity(config.scheduler.bus_capacity));

        let zones = Arc::new(MeetingZoneRegistry::new());
        for segment_id in config.segment_ids() {
            zones.register(segment_id, config.topology.zone_capacity)?;
        }
        info!(
            zones = zones.len(),
            capacity = config.topology.zone_capacity,
            "Meeting zones registered"
        );

        let lanes = config.lane_map();
        info!(lanes = lanes.len(), "Lane map loaded");
        let classifier = Arc::new(VehicleClassifier::with_rules(lanes, config.plates.clone()));

        Ok(Self {
            config,
            zones,
            classifier,
            event_bus,
        })
    }

    /// One state machine per configured segment, zone id = segment id.
    pub fn build_segments(&self, now: Instant) -> Vec<SegmentStateMachine> {
        let segment_config = self.config.segment_config();
        let zones: Arc<dyn MeetingZoneApi> = self.zones.clone();
        self.config
            .segment_ids()
            .into_iter()
            .map(|id| {
                SegmentStateMachine::new(id, id, segment_config.clone(), Arc::clone(&zones), now)
            })
            .collect()
    }

    pub fn build_system(&self, now: Instant) -> SystemResult<SystemStateMachine> {
        SystemStateMachine::new(self.config.system_config(), self.config.segment_ids(), now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{SegmentState, Side};

    #[test]
    fn test_container_registers_zones() {
        let mut config = SignalConfig::default();
        config.topology.segment_count = 3;
        config.topology.zone_capacity = 4;

        let container = SignalContainer::new(config).unwrap();
        assert_eq!(container.zones.zone_ids(), vec![1, 2, 3]);
        assert_eq!(container.zones.has_capacity(2, Side::Upstream), Ok(true));
        assert_eq!(container.classifier.lanes().segment_for(6), Some(3));

        let now = Instant::now();
        let segments = container.build_segments(now);
        assert_eq!(segments.len(), 3);
        assert!(segments
            .iter()
            .all(|s| s.state() == SegmentState::AllRedClear));
        assert!(container.build_system(now).is_ok());
    }
}
