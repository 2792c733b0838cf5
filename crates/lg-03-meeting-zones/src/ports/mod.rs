//! Ports for the meeting-zone registry

pub mod inbound;

pub use inbound::MeetingZoneApi;
