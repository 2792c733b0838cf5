//! # lg-05-segment-control
//!
//! Right-of-way control for one single-lane, bidirectional segment.
//!
//! ## Overview
//!
//! ```text
//! Classifier (2) ──vehicle events──┐
//! Scheduler ──timer events─────────┼──→ SegmentStateMachine ──notifications──→ System (6)
//! System (6) ──commands────────────┘          │
//!                                             ├── Meeting zones (3): waiting vehicles
//!                                             └── Clearance (4): safe-to-switch verdict
//! ```
//!
//! ## Safety Invariants
//!
//! - At most one direction is green; greens are separated by all-red.
//! - All-red is left only on a clear verdict or a forced conservative clear.
//! - A plate inside a direction's set was admitted and has not exited.

pub mod domain;
pub mod error;
pub mod service;

pub use domain::{
    DirectionFlow, DirectionSnapshot, SegmentConfig, SegmentFaultReason, SegmentNotification,
    SegmentSnapshot, SegmentVariables,
};
pub use error::{SegmentError, SegmentResult};
pub use service::SegmentStateMachine;
