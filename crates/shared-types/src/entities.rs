//! # Core Domain Entities
//!
//! Identifiers and value objects shared by every LaneGuard component.
//!
//! ## Clusters
//!
//! - **Topology**: `SegmentId`, `ZoneId`, `LaneIndex`, `Side`
//! - **Vehicles**: `PlateId`

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// CLUSTER A: TOPOLOGY
// =============================================================================

/// Identifier of a controlled road segment.
///
/// `0` is reserved: detections mapped to segment 0 are statistics-only.
pub type SegmentId = u16;

/// Identifier of a meeting/waiting zone.
pub type ZoneId = u16;

/// Detector lane index as reported on the wire.
pub type LaneIndex = u8;

/// The reserved "no segment" identifier.
pub const STATISTICS_ONLY_SEGMENT: SegmentId = 0;

/// One of the two travel directions of a bidirectional segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    /// Traffic travelling in the upstream direction.
    Upstream,
    /// Traffic travelling in the downstream direction.
    Downstream,
}

impl Side {
    /// The conflicting direction.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Upstream => Self::Downstream,
            Self::Downstream => Self::Upstream,
        }
    }

    /// Both sides, upstream first.
    pub const BOTH: [Side; 2] = [Side::Upstream, Side::Downstream];
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upstream => f.write_str("upstream"),
            Self::Downstream => f.write_str("downstream"),
        }
    }
}

// =============================================================================
// CLUSTER B: VEHICLES
// =============================================================================

/// A licence-plate identifier as read by a detector.
///
/// Plates are compared exactly; normalisation (trimming of wire padding)
/// happens in the protocol decoder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlateId(String);

impl PlateId {
    /// Wrap a plate string.
    pub fn new(plate: impl Into<String>) -> Self {
        Self(plate.into())
    }

    /// Borrow the plate text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlateId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Upstream.opposite(), Side::Downstream);
        assert_eq!(Side::Downstream.opposite(), Side::Upstream);
    }

    #[test]
    fn test_plate_display() {
        let plate = PlateId::from("A1");
        assert_eq!(plate.to_string(), "A1");
        assert_eq!(plate.as_str(), "A1");
    }
}
