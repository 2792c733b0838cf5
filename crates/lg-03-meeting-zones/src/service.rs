//! Meeting-Zone Registry
//!
//! Constructed once by the composition root and shared by handle with every
//! segment. Zones live in a `DashMap`, so updates lock a single shard and
//! concurrent segments only contend when they touch the same zone shard.

use crate::domain::{EnterOutcome, MeetingZone, ZoneSnapshot};
use crate::error::{ZoneError, ZoneResult};
use crate::ports::MeetingZoneApi;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use shared_types::{PlateId, Side, ZoneId};
use tracing::{debug, info, warn};

/// Registry of meeting zones
#[derive(Debug, Default)]
pub struct MeetingZoneRegistry {
    zones: DashMap<ZoneId, MeetingZone>,
}

impl MeetingZoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a zone entirely. Returns whether it existed.
    pub fn unregister(&self, zone: ZoneId) -> bool {
        self.zones.remove(&zone).is_some()
    }

    /// Registered zone ids, sorted.
    pub fn zone_ids(&self) -> Vec<ZoneId> {
        let mut ids: Vec<_> = self.zones.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    fn with_zone<T>(&self, zone: ZoneId, f: impl FnOnce(&MeetingZone) -> T) -> ZoneResult<T> {
        self.zones
            .get(&zone)
            .map(|entry| f(entry.value()))
            .ok_or(ZoneError::ZoneNotFound(zone))
    }

    fn with_zone_mut<T>(
        &self,
        zone: ZoneId,
        f: impl FnOnce(&mut MeetingZone) -> T,
    ) -> ZoneResult<T> {
        self.zones
            .get_mut(&zone)
            .map(|mut entry| f(entry.value_mut()))
            .ok_or(ZoneError::ZoneNotFound(zone))
    }
}

impl MeetingZoneApi for MeetingZoneRegistry {
    fn register(&self, zone: ZoneId, capacity: usize) -> ZoneResult<()> {
        if capacity == 0 {
            return Err(ZoneError::ZeroCapacity(zone));
        }
        match self.zones.entry(zone) {
            Entry::Occupied(_) => Err(ZoneError::AlreadyRegistered(zone)),
            Entry::Vacant(slot) => {
                slot.insert(MeetingZone::new(capacity));
                info!(zone_id = zone, capacity, "Meeting zone registered");
                Ok(())
            }
        }
    }

    fn has_capacity(&self, zone: ZoneId, side: Side) -> ZoneResult<bool> {
        self.with_zone(zone, |z| z.area(side).has_capacity())
    }

    fn vehicle_enter(&self, zone: ZoneId, side: Side, plate: PlateId) -> ZoneResult<bool> {
        let outcome = self.with_zone_mut(zone, |z| {
            let area = z.area_mut(side);
            (area.enter(plate.clone()), area.capacity())
        })?;

        match outcome {
            (EnterOutcome::Added, _) => {
                debug!(zone_id = zone, %side, %plate, "Vehicle waiting in meeting zone");
                Ok(true)
            }
            (EnterOutcome::AlreadyPresent, _) => Ok(false),
            (EnterOutcome::Full, capacity) => {
                warn!(zone_id = zone, %side, %plate, capacity, "Meeting zone full");
                Err(ZoneError::CapacityExceeded {
                    zone,
                    side,
                    capacity,
                })
            }
        }
    }

    fn vehicle_exit(&self, zone: ZoneId, side: Side, plate: &PlateId) -> ZoneResult<bool> {
        self.with_zone_mut(zone, |z| z.area_mut(side).exit(plate))
    }

    fn count(&self, zone: ZoneId, side: Side) -> ZoneResult<usize> {
        self.with_zone(zone, |z| z.area(side).count())
    }

    fn clear(&self, zone: ZoneId, side: Side) -> ZoneResult<()> {
        self.with_zone_mut(zone, |z| z.area_mut(side).clear())
    }

    fn clear_zone(&self, zone: ZoneId) -> ZoneResult<()> {
        self.with_zone_mut(zone, |z| {
            z.upstream.clear();
            z.downstream.clear();
        })
    }

    fn drain(&self, zone: ZoneId, side: Side) -> ZoneResult<Vec<PlateId>> {
        self.with_zone_mut(zone, |z| z.area_mut(side).drain())
    }

    fn snapshot(&self, zone: ZoneId) -> ZoneResult<ZoneSnapshot> {
        self.with_zone(zone, |z| ZoneSnapshot::of(zone, z))
    }
}
