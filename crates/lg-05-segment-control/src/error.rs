//! Error types for segment control
//!
//! Only malformed input is an error. Vehicle-count inconsistencies are
//! recorded in the segment's health counters instead.

use lg_03_meeting_zones::ZoneError;
use shared_types::{SegmentEvent, SegmentId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SegmentError {
    /// Payload addressed to another segment
    #[error("Event for segment {got} delivered to segment {expected}")]
    WrongSegment { expected: SegmentId, got: SegmentId },

    /// Vehicle event without a plate
    #[error("{0:?} requires a plate")]
    MissingPlate(SegmentEvent),

    /// Meeting-zone failure other than a full area
    #[error("Meeting zone error: {0}")]
    Zone(#[from] ZoneError),
}

/// Result type for segment operations
pub type SegmentResult<T> = Result<T, SegmentError>;
