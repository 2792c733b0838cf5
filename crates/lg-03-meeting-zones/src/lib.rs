//! # lg-03-meeting-zones
//!
//! Capacity-bounded waiting areas at single-lane crossing points.
//!
//! Each zone holds one [`MeetingArea`] per direction. A vehicle that reaches a
//! segment while the opposite direction holds right-of-way waits in its
//! direction's area; the waiting plates are what a segment treats as a
//! right-of-way request.
//!
//! The registry is an explicit instance created by the composition root and
//! passed to segments as `Arc<dyn MeetingZoneApi>`.

pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use domain::{EnterOutcome, MeetingArea, MeetingZone, ZoneSnapshot};
pub use error::{ZoneError, ZoneResult};
pub use ports::MeetingZoneApi;
pub use service::MeetingZoneRegistry;
