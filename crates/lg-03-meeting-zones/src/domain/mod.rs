//! Domain module for the meeting-zone registry

pub mod area;

pub use area::{EnterOutcome, MeetingArea, MeetingZone, ZoneSnapshot};
