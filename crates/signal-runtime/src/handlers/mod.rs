//! # Handlers
//!
//! Tasks feeding the scheduler: detector connections and the timer.

pub mod detector;
pub mod listener;
pub mod timer;

pub use detector::{ConnectionInfo, DetectorHandler, DetectorRouter};
pub use listener::run_listener;
pub use timer::run_timer;
