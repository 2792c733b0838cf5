//! # lg-04-clearance
//!
//! Decides whether a segment is clear enough to switch right-of-way.
//!
//! ## Verdicts
//!
//! Ordered from least to most safe: `Wait < Conservative < Warning < Safe`.
//! The combined verdict of a segment is the least safe of its two directions.
//!
//! ```text
//! decide(up) ──┐
//!              ├── combine ── apply_sensor_health ──→ verdict
//! decide(down)─┘                                        │
//!                          Conservative ── start timer ─┤
//!                          elapsed ≥ duration ──────────┴──→ force clear
//! ```

pub mod domain;
pub mod service;

pub use domain::{apply_sensor_health, combine, decide, ConservativeClearTimer, DirectionView};
pub use service::{ClearanceEngine, ClearanceEvaluation};
