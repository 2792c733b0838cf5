//! Drop reasons for the vehicle classifier

use shared_types::LaneIndex;
use thiserror::Error;

/// Why a detection did not become a segment event
///
/// A drop never mutates segment state. Drops are counted per reason in
/// [`crate::ClassifierStats`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyDrop {
    /// No plate was read
    #[error("No plate present")]
    MissingPlate,

    /// Plate text rejected by the plate rules
    #[error("Invalid plate {plate:?}: {reason}")]
    InvalidPlate { plate: String, reason: PlateRejection },

    /// Lane has no segment binding
    #[error("Lane {0} is not mapped to a segment")]
    UnmappedLane(LaneIndex),

    /// Lane is bound to segment 0, which only feeds statistics
    #[error("Lane {0} is statistics-only")]
    StatisticsOnly(LaneIndex),

    /// Direction code other than toward/away
    #[error("Unknown direction code {0}")]
    UnknownDirection(u8),
}

impl ClassifyDrop {
    /// Short stable label, used as a metric dimension.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingPlate => "missing_plate",
            Self::InvalidPlate { .. } => "invalid_plate",
            Self::UnmappedLane(_) => "unmapped_lane",
            Self::StatisticsOnly(_) => "statistics_only",
            Self::UnknownDirection(_) => "unknown_direction",
        }
    }
}

/// Why plate text failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlateRejection {
    #[error("shorter than {0} characters")]
    TooShort(usize),
    #[error("longer than {0} characters")]
    TooLong(usize),
    #[error("placeholder text")]
    Placeholder,
    #[error("contains control characters")]
    ControlCharacters,
}

/// Result type for classification
pub type ClassifyResult<T> = Result<T, ClassifyDrop>;
