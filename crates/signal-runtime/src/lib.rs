//! # LaneGuard Signal Runtime
//!
//! Library half of the controller executable, split out so the scheduler and
//! handlers can be driven from integration tests.
//!
//! - `container/` - configuration and shared component construction
//! - `scheduler/` - segment and system actors
//! - `handlers/` - detector connections and the timer
//!
//! ```text
//! TCP ──► DetectorConnection ──► DetectorRouter ──► EventScheduler
//!                                  (classify)        │        │
//!                                                segments   system
//!                                                    └─► bus ◄┘
//! ```

pub mod container;
pub mod handlers;
pub mod runtime;
pub mod scheduler;

pub use runtime::SignalRuntime;
pub use scheduler::{Dispatch, EventScheduler, SchedulerError, SchedulerResult};
