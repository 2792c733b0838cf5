//! Meeting area
//!
//! The occupancy count is the size of the plate set. There is no separate
//! counter that could drift from the set.

use serde::{Deserialize, Serialize};
use shared_types::{PlateId, Side, ZoneId};
use std::collections::HashSet;

/// Vehicles of one direction waiting at a crossing point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingArea {
    plates: HashSet<PlateId>,
    capacity: usize,
}

/// Result of [`MeetingArea::enter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnterOutcome {
    Added,
    AlreadyPresent,
    Full,
}

impl MeetingArea {
    pub fn new(capacity: usize) -> Self {
        Self {
            plates: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn count(&self) -> usize {
        self.plates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plates.is_empty()
    }

    pub fn has_capacity(&self) -> bool {
        self.count() < self.capacity
    }

    pub fn contains(&self, plate: &PlateId) -> bool {
        self.plates.contains(plate)
    }

    /// Add a plate. A plate already present is not counted twice.
    pub fn enter(&mut self, plate: PlateId) -> EnterOutcome {
        if self.plates.contains(&plate) {
            return EnterOutcome::AlreadyPresent;
        }
        if !self.has_capacity() {
            return EnterOutcome::Full;
        }
        self.plates.insert(plate);
        EnterOutcome::Added
    }

    /// Remove a plate. Returns whether it was present.
    pub fn exit(&mut self, plate: &PlateId) -> bool {
        self.plates.remove(plate)
    }

    pub fn clear(&mut self) {
        self.plates.clear();
    }

    /// Remove and return every plate, sorted.
    pub fn drain(&mut self) -> Vec<PlateId> {
        let mut plates: Vec<_> = self.plates.drain().collect();
        plates.sort();
        plates
    }

    /// Plates currently waiting, sorted.
    pub fn plates(&self) -> Vec<PlateId> {
        let mut plates: Vec<_> = self.plates.iter().cloned().collect();
        plates.sort();
        plates
    }
}

/// One zone: an area per direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingZone {
    pub upstream: MeetingArea,
    pub downstream: MeetingArea,
}

impl MeetingZone {
    pub fn new(capacity: usize) -> Self {
        Self {
            upstream: MeetingArea::new(capacity),
            downstream: MeetingArea::new(capacity),
        }
    }

    pub fn area(&self, side: Side) -> &MeetingArea {
        match side {
            Side::Upstream => &self.upstream,
            Side::Downstream => &self.downstream,
        }
    }

    pub fn area_mut(&mut self, side: Side) -> &mut MeetingArea {
        match side {
            Side::Upstream => &mut self.upstream,
            Side::Downstream => &mut self.downstream,
        }
    }
}

/// Read-only view of one zone for status reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneSnapshot {
    pub zone_id: ZoneId,
    pub capacity: usize,
    pub upstream: Vec<PlateId>,
    pub downstream: Vec<PlateId>,
}

impl ZoneSnapshot {
    pub fn of(zone_id: ZoneId, zone: &MeetingZone) -> Self {
        Self {
            zone_id,
            capacity: zone.upstream.capacity(),
            upstream: zone.upstream.plates(),
            downstream: zone.downstream.plates(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_is_idempotent() {
        let mut area = MeetingArea::new(2);
        assert_eq!(area.enter("A1".into()), EnterOutcome::Added);
        assert_eq!(area.enter("A1".into()), EnterOutcome::AlreadyPresent);
        assert_eq!(area.count(), 1);
    }

    #[test]
    fn test_exit_absent_plate_is_noop() {
        let mut area = MeetingArea::new(2);
        area.enter("A1".into());
        assert!(area.exit(&"A1".into()));
        assert!(!area.exit(&"A1".into()));
        assert_eq!(area.count(), 0);
    }

    #[test]
    fn test_capacity_bound() {
        let mut area = MeetingArea::new(1);
        assert!(area.has_capacity());
        area.enter("A1".into());
        assert!(!area.has_capacity());
        assert_eq!(area.enter("B2".into()), EnterOutcome::Full);
        // Present plate is not reported as full
        assert_eq!(area.enter("A1".into()), EnterOutcome::AlreadyPresent);
    }

    #[test]
    fn test_drain_sorted() {
        let mut area = MeetingArea::new(4);
        area.enter("C3".into());
        area.enter("A1".into());
        area.enter("B2".into());
        let drained = area.drain();
        assert_eq!(
            drained,
            vec![PlateId::from("A1"), PlateId::from("B2"), PlateId::from("C3")]
        );
        assert!(area.is_empty());
    }
}
