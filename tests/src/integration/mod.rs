//! # Integration Tests
//!
//! Wire frames, clearance verdicts and the two-level state machine exercised
//! together, the way a deployed controller sees them.

pub mod scenarios;
