//! Ports for the detector protocol

pub mod outbound;

pub use outbound::FrameSink;
