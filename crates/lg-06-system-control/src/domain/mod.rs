//! Domain module for system control
//!
//! ## Core Modules
//! - config: timing, recovery thresholds and health deltas
//! - event: system events and the segment commands they imply
//! - variables: system-wide state and its snapshot

pub mod config;
pub mod event;
pub mod variables;

pub use config::{health, SystemConfig};
pub use event::{SegmentCommand, SystemEvent, SystemTransition};
pub use variables::{FaultRecord, SystemSnapshot, SystemVariables};
