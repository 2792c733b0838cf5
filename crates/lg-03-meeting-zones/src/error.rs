//! Error types for the meeting-zone registry

use shared_types::{Side, ZoneId};
use thiserror::Error;

/// Meeting-zone registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZoneError {
    /// Zone id registered twice
    #[error("Zone {0} is already registered")]
    AlreadyRegistered(ZoneId),

    /// Operation on a zone that was never registered
    #[error("Zone {0} not found")]
    ZoneNotFound(ZoneId),

    /// Registration with capacity 0
    #[error("Zone {0} capacity must be at least 1")]
    ZeroCapacity(ZoneId),

    /// Area already holds `capacity` vehicles
    #[error("Zone {zone} {side} area is full ({capacity} vehicles)")]
    CapacityExceeded {
        zone: ZoneId,
        side: Side,
        capacity: usize,
    },
}

/// Result type for zone operations
pub type ZoneResult<T> = Result<T, ZoneError>;
