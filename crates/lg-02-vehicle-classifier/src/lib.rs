//! # lg-02-vehicle-classifier
//!
//! Turns vehicle detections into segment events.
//!
//! ## Overview
//!
//! ```text
//! Detector Protocol (1) ──VehicleDetection──→ Classifier (2) ──SegmentEvent──→ Segment (5)
//!                                                  │
//!                                                  └── drop (counted, no state change)
//! ```
//!
//! A detection is dropped when no plate was read, the plate fails the
//! configured rules, the lane is unmapped or bound to segment 0, or the
//! direction code is neither 1 (toward sensor) nor 2 (away from sensor).

pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use domain::{classify, ClassifiedEvent, LaneMap, LaneParity, PlateRules};
pub use error::{ClassifyDrop, ClassifyResult, PlateRejection};
pub use ports::PlateValidator;
pub use service::{ClassifierStats, ClassifierStatsSnapshot, VehicleClassifier};
