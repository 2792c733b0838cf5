//! Scheduler errors

use lg_05_segment_control::SegmentError;
use lg_06_system_control::SystemError;
use shared_types::SegmentId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("No actor for segment {0}")]
    UnknownSegment(SegmentId),

    /// Queue full; only returned for dropped timer ticks
    #[error("Queue full for {target}")]
    QueueFull { target: String },

    /// The actor stopped (shutdown or panic)
    #[error("Actor for {target} stopped")]
    ActorStopped { target: String },

    #[error(transparent)]
    Segment(#[from] SegmentError),

    #[error(transparent)]
    System(#[from] SystemError),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
