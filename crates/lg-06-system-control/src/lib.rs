//! # lg-06-system-control
//!
//! Top-level supervisor coordinating every segment.
//!
//! ## State Diagram
//!
//! ```text
//! SYSTEM_INIT ──self-check + config + delay──→ ALL_RED_TRANSITION
//!                                                │        │
//!                                    all cleared │        │ timeout
//!                                                ↓        ↓
//!                     fault / degrade ←── INDUCTIVE ──→ DEGRADED
//!                     (back to all-red)      │  segment   │
//!                                            │  fault     │ recovered
//!                                            │            ↓
//!                                            │      ALL_RED_TRANSITION
//!                                            ↓
//!                              EMERGENCY / MAINTENANCE ──reset──→ SYSTEM_INIT
//! ```
//!
//! Every transition carries a [`SegmentCommand`] for all segments.

pub mod domain;
pub mod error;
pub mod service;

pub use domain::{
    FaultRecord, SegmentCommand, SystemConfig, SystemEvent, SystemSnapshot, SystemTransition,
    SystemVariables,
};
pub use error::{SystemError, SystemResult};
pub use service::SystemStateMachine;
