//! Driving Ports (API - Inbound)

use crate::domain::ZoneSnapshot;
use crate::error::ZoneResult;
use shared_types::{PlateId, Side, ZoneId};

/// Meeting-zone operations used by segment state machines
///
/// Every call is atomic per zone. Calls on different zones never contend.
pub trait MeetingZoneApi: Send + Sync {
    /// Create a zone with one area per direction.
    ///
    /// Fails with `AlreadyRegistered` if the id exists.
    fn register(&self, zone: ZoneId, capacity: usize) -> ZoneResult<()>;

    /// `count < capacity` for the given area.
    fn has_capacity(&self, zone: ZoneId, side: Side) -> ZoneResult<bool>;

    /// Add a plate. Returns `false` if it was already present.
    fn vehicle_enter(&self, zone: ZoneId, side: Side, plate: PlateId) -> ZoneResult<bool>;

    /// Remove a plate. Returns `false` if it was not present.
    fn vehicle_exit(&self, zone: ZoneId, side: Side, plate: &PlateId) -> ZoneResult<bool>;

    fn count(&self, zone: ZoneId, side: Side) -> ZoneResult<usize>;

    /// Empty one area.
    fn clear(&self, zone: ZoneId, side: Side) -> ZoneResult<()>;

    /// Empty both areas.
    fn clear_zone(&self, zone: ZoneId) -> ZoneResult<()>;

    /// Empty one area and return its plates, sorted.
    fn drain(&self, zone: ZoneId, side: Side) -> ZoneResult<Vec<PlateId>>;

    fn snapshot(&self, zone: ZoneId) -> ZoneResult<ZoneSnapshot>;
}
