//! # lg-01-detector-protocol
//!
//! Wire protocol spoken by roadside plate-recognition detectors.
//!
//! ## Overview
//!
//! This subsystem provides:
//! - **Framing**: start/end markers with byte escaping
//! - **Verification**: 16-bit big-endian length and XOR checksum
//! - **Streaming Decoder**: frames split or coalesced across socket reads
//! - **Heartbeat Echo**: heartbeats are sent back byte-identical
//!
//! ## Frame Layout
//!
//! ```text
//! 0x7E | LEN_HI LEN_LO | DATA ... | XOR(DATA) | 0x7D
//!       └──────────── escaped with 0x5C ──────┘
//! ```
//!
//! LEN counts DATA plus the checksum byte. Any occurrence of 0x7E, 0x7D or
//! 0x5C between the markers is preceded by 0x5C on the wire.
//!
//! ## Example
//!
//! ```rust,ignore
//! use lg_01_detector_protocol::{ConnectionConfig, DetectorConnection};
//!
//! let (socket, peer) = listener.accept().await?;
//! let stats = DetectorConnection::new(socket, peer.to_string(), ConnectionConfig::default())
//!     .run(&router)
//!     .await?;
//! ```

pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use domain::{
    encode_vehicle_record, is_heartbeat_payload, DetectorFrame, FrameDecoder, FrameEncoder,
    VehicleDetection, DIRECTION_AWAY_FROM_SENSOR, DIRECTION_TOWARD_SENSOR,
};
pub use error::{ProtocolError, ProtocolResult};
pub use ports::FrameSink;
pub use service::{ConnectionConfig, ConnectionStats, DetectorConnection};
