//! Ports for the vehicle classifier

pub mod outbound;

pub use outbound::PlateValidator;
