//! Domain module for the clearance decision engine
//!
//! ## Core Modules
//! - decision: single-direction verdict, combinator, sensor-health downgrade
//! - timer: conservative-clear timer

pub mod decision;
pub mod timer;

pub use decision::{apply_sensor_health, combine, decide, DirectionView};
pub use timer::ConservativeClearTimer;
