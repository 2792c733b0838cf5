//! Lane to segment bindings
//!
//! Every segment is observed by a pair of detector lanes. The lane's parity
//! fixes its boundary role:
//!
//! | Lane | Toward sensor (1) | Away from sensor (2) |
//! |------|-------------------|----------------------|
//! | odd  | enter upstream    | exit downstream      |
//! | even | exit upstream     | enter downstream     |

use shared_types::{LaneIndex, Movement, SegmentEvent, SegmentId, Side};
use std::collections::BTreeMap;

/// Boundary role of a lane, derived from its parity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneParity {
    Odd,
    Even,
}

impl LaneParity {
    pub fn of(lane: LaneIndex) -> Self {
        if lane % 2 == 1 {
            Self::Odd
        } else {
            Self::Even
        }
    }

    /// Segment event for a vehicle crossing this lane in `direction_code`.
    ///
    /// Returns `None` for direction codes other than 1 and 2.
    pub fn event_for(self, direction_code: u8) -> Option<SegmentEvent> {
        let (side, movement) = match (self, direction_code) {
            (Self::Odd, 1) => (Side::Upstream, Movement::Enter),
            (Self::Odd, 2) => (Side::Downstream, Movement::Exit),
            (Self::Even, 1) => (Side::Upstream, Movement::Exit),
            (Self::Even, 2) => (Side::Downstream, Movement::Enter),
            _ => return None,
        };
        Some(SegmentEvent::vehicle(side, movement))
    }
}

/// Static lane → segment table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaneMap {
    bindings: BTreeMap<LaneIndex, SegmentId>,
}

impl LaneMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default binding: lanes `2k-1` and `2k` observe segment `k`.
    pub fn sequential(segment_count: u16) -> Self {
        let mut map = Self::new();
        for segment in 1..=segment_count {
            let odd = segment.saturating_mul(2).saturating_sub(1);
            let (Ok(odd), Ok(even)) = (LaneIndex::try_from(odd), LaneIndex::try_from(odd + 1))
            else {
                break;
            };
            map.bind(odd, segment);
            map.bind(even, segment);
        }
        map
    }

    /// Bind a lane, replacing any previous binding.
    pub fn bind(&mut self, lane: LaneIndex, segment: SegmentId) -> &mut Self {
        self.bindings.insert(lane, segment);
        self
    }

    pub fn segment_for(&self, lane: LaneIndex) -> Option<SegmentId> {
        self.bindings.get(&lane).copied()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LaneIndex, SegmentId)> + '_ {
        self.bindings.iter().map(|(&lane, &segment)| (lane, segment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parity_table() {
        assert_eq!(
            LaneParity::Odd.event_for(1),
            Some(SegmentEvent::VehicleEnterUpstream)
        );
        assert_eq!(
            LaneParity::Odd.event_for(2),
            Some(SegmentEvent::VehicleExitDownstream)
        );
        assert_eq!(
            LaneParity::Even.event_for(1),
            Some(SegmentEvent::VehicleExitUpstream)
        );
        assert_eq!(
            LaneParity::Even.event_for(2),
            Some(SegmentEvent::VehicleEnterDownstream)
        );
        assert_eq!(LaneParity::Odd.event_for(0), None);
        assert_eq!(LaneParity::Even.event_for(3), None);
    }

    #[test]
    fn test_parity_of() {
        assert_eq!(LaneParity::of(1), LaneParity::Odd);
        assert_eq!(LaneParity::of(2), LaneParity::Even);
        assert_eq!(LaneParity::of(0), LaneParity::Even);
    }

    #[test]
    fn test_sequential_binding() {
        let map = LaneMap::sequential(3);
        assert_eq!(map.len(), 6);
        assert_eq!(map.segment_for(1), Some(1));
        assert_eq!(map.segment_for(2), Some(1));
        assert_eq!(map.segment_for(5), Some(3));
        assert_eq!(map.segment_for(6), Some(3));
        assert_eq!(map.segment_for(7), None);
    }

    #[test]
    fn test_sequential_stops_at_lane_range() {
        // 128 segments need lane 256, which does not exist
        let map = LaneMap::sequential(200);
        assert_eq!(map.len(), 254);
        assert_eq!(map.segment_for(254), Some(127));
    }
}
