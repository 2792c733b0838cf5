//! Error types for system control

use shared_types::SegmentId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SystemError {
    /// Segment not part of the configured topology
    #[error("Unknown segment {0}")]
    UnknownSegment(SegmentId),

    /// System created without segments
    #[error("System requires at least one segment")]
    NoSegments,
}

/// Result type for system operations
pub type SystemResult<T> = Result<T, SystemError>;
