//! # Signal Events
//!
//! Everything published on the bus. Consumers are the status publisher,
//! metrics and tests; control decisions never depend on bus delivery.

use serde::{Deserialize, Serialize};
use shared_types::{ClearanceDecision, SegmentId, SegmentState, SystemState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalEvent {
    // =========================================================================
    // SEGMENT CONTROL
    // =========================================================================
    /// A segment changed state.
    SegmentStateChanged {
        segment_id: SegmentId,
        from: SegmentState,
        to: SegmentState,
    },

    /// The clearance verdict or forced-clear flag of a segment changed.
    ClearanceEvaluated {
        segment_id: SegmentId,
        decision: ClearanceDecision,
        force_clear: bool,
    },

    /// A segment escalated a fault to the system level.
    SegmentFault {
        segment_id: SegmentId,
        reason: String,
    },

    // =========================================================================
    // SYSTEM CONTROL
    // =========================================================================
    SystemStateChanged {
        from: SystemState,
        to: SystemState,
        health_score: u8,
    },

    // =========================================================================
    // DETECTORS
    // =========================================================================
    DetectorConnected { peer: String },

    DetectorDisconnected {
        peer: String,
        /// Set when the connection ended on an error
        error: Option<String>,
    },
}

impl SignalEvent {
    /// Get the topic for this event.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::SegmentStateChanged { .. } => EventTopic::Segment,
            Self::ClearanceEvaluated { .. } => EventTopic::Clearance,
            Self::SegmentFault { .. } => EventTopic::Fault,
            Self::SystemStateChanged { .. } => EventTopic::System,
            Self::DetectorConnected { .. } | Self::DetectorDisconnected { .. } => {
                EventTopic::Detector
            }
        }
    }

    /// Segment the event concerns, if any.
    #[must_use]
    pub fn segment_id(&self) -> Option<SegmentId> {
        match self {
            Self::SegmentStateChanged { segment_id, .. }
            | Self::ClearanceEvaluated { segment_id, .. }
            | Self::SegmentFault { segment_id, .. } => Some(*segment_id),
            _ => None,
        }
    }
}

/// Event topics for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    Segment,
    Clearance,
    Fault,
    System,
    Detector,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Segments to include. Empty means all segments; events without a
    /// segment always pass.
    pub segments: Vec<SegmentId>,
}

impl EventFilter {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            segments: Vec::new(),
        }
    }

    #[must_use]
    pub fn segments(segments: Vec<SegmentId>) -> Self {
        Self {
            topics: Vec::new(),
            segments,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &SignalEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let segment_match = match event.segment_id() {
            Some(id) => self.segments.is_empty() || self.segments.contains(&id),
            None => true,
        };

        topic_match && segment_match
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_changed(segment_id: SegmentId) -> SignalEvent {
        SignalEvent::SegmentStateChanged {
            segment_id,
            from: SegmentState::AllRedClear,
            to: SegmentState::UpstreamGreen,
        }
    }

    #[test]
    fn test_event_topic_mapping() {
        assert_eq!(state_changed(1).topic(), EventTopic::Segment);
        assert_eq!(
            SignalEvent::DetectorConnected {
                peer: "10.0.0.7:4001".into()
            }
            .topic(),
            EventTopic::Detector
        );
    }

    #[test]
    fn test_filter_by_topic() {
        let filter = EventFilter::topics(vec![EventTopic::Fault, EventTopic::System]);
        assert!(!filter.matches(&state_changed(1)));
        assert!(filter.matches(&SignalEvent::SegmentFault {
            segment_id: 1,
            reason: "max red".into()
        }));
    }

    #[test]
    fn test_filter_by_segment() {
        let filter = EventFilter::segments(vec![2]);
        assert!(!filter.matches(&state_changed(1)));
        assert!(filter.matches(&state_changed(2)));

        // System events carry no segment
        assert!(filter.matches(&SignalEvent::SystemStateChanged {
            from: SystemState::SystemInit,
            to: SystemState::AllRedTransition,
            health_score: 100,
        }));
    }

    #[test]
    fn test_event_serializes() {
        let json = serde_json::to_string(&state_changed(3)).unwrap();
        assert!(json.contains("SegmentStateChanged"));
        let back: SignalEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state_changed(3));
    }
}
