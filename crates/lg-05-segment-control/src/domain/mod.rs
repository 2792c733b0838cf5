//! Domain module for segment control
//!
//! ## Core Modules
//! - config: timing parameters and health deltas
//! - variables: per-segment mutable state and its snapshot
//! - transitions: pure guards and the command table
//! - notification: outputs to the system level

pub mod config;
pub mod notification;
pub mod transitions;
pub mod variables;

pub use config::{health, SegmentConfig};
pub use notification::{SegmentFaultReason, SegmentNotification};
pub use transitions::{choose_green_side, command_target, may_leave_green, GreenGuard};
pub use variables::{DirectionFlow, DirectionSnapshot, SegmentSnapshot, SegmentVariables};
