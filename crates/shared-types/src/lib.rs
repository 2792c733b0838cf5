//! # Shared Types Crate
//!
//! Identifiers, events and state vocabulary shared across the LaneGuard
//! components.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-component types are defined here.
//! - **No Logic Duplication**: Behaviour lives in the owning component crate;
//!   this crate only carries small helpers on the types themselves.

pub mod entities;
pub mod events;
pub mod signals;

pub use entities::*;
pub use events::*;
pub use signals::*;
