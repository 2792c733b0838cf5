//! Domain module for the vehicle classifier
//!
//! ## Core Modules
//! - lane_map: lane bindings and the parity rule
//! - plate: plate validation rules
//! - classifier: pure detection → event mapping

pub mod classifier;
pub mod lane_map;
pub mod plate;

pub use classifier::{classify, ClassifiedEvent};
pub use lane_map::{LaneMap, LaneParity};
pub use plate::PlateRules;
