//! Domain module for the detector protocol
//!
//! ## Core Modules
//! - codec: escaping, checksum, streaming frame decoder and encoder
//! - message: typed heartbeat / vehicle detection messages

pub mod codec;
pub mod message;

pub use codec::{
    escape, unescape, verify_body, xor_checksum, FrameDecoder, FrameEncoder, END_MARKER,
    ESCAPE_BYTE, MAX_FRAME_BODY, START_MARKER,
};
pub use message::{
    encode_vehicle_record, is_heartbeat_payload, DetectorFrame, VehicleDetection,
    DIRECTION_AWAY_FROM_SENSOR, DIRECTION_TOWARD_SENSOR, MSG_HEARTBEAT, MSG_VEHICLE_DETECTION,
};
