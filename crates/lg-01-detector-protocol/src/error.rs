//! Error types for the detector protocol

use thiserror::Error;

/// Detector protocol errors
///
/// Frame-level errors drop one frame and decoding resumes at the next start
/// marker. Stream-level errors end the connection task.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Fewer bytes than length field + checksum between the markers
    #[error("Frame too short: {len} unescaped bytes, need at least 3")]
    FrameTooShort { len: usize },

    /// Declared length does not match the bytes received
    #[error("Length mismatch: header declares {declared}, frame carries {actual}")]
    LengthMismatch { declared: u16, actual: usize },

    /// XOR checksum over the data bytes does not match
    #[error("Checksum mismatch: computed {computed:#04x}, received {received:#04x}")]
    ChecksumMismatch { computed: u8, received: u8 },

    /// Frame body grew beyond the decoder limit before an end marker
    #[error("Frame exceeds {limit} bytes without end marker")]
    FrameTooLong { limit: usize },

    /// A start marker arrived inside an unfinished frame
    #[error("Unexpected start marker, discarded {discarded} buffered bytes")]
    UnexpectedStartMarker { discarded: usize },

    /// Frame verified but carries no data bytes
    #[error("Empty payload")]
    EmptyPayload,

    /// First data byte is not a known message type
    #[error("Unknown message type: {0:#04x}")]
    UnknownMessageType(u8),

    /// Message body shorter than its fixed layout
    #[error("Truncated {kind} message: expected {expected} bytes, got {actual}")]
    TruncatedMessage {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Data too large to express in the 16-bit length field
    #[error("Payload of {len} bytes does not fit the length field")]
    PayloadTooLarge { len: usize },

    /// Peer closed the stream in the middle of a frame
    #[error("Stream closed mid-frame with {buffered} bytes buffered")]
    StreamClosedMidFrame { buffered: usize },

    /// No bytes arrived within the read timeout
    #[error("Read timed out after {after_ms} ms")]
    ReadTimeout { after_ms: u64 },

    /// Socket error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    /// Whether only the current frame is lost and the connection stays open.
    pub fn is_frame_error(&self) -> bool {
        !matches!(
            self,
            Self::StreamClosedMidFrame { .. } | Self::ReadTimeout { .. } | Self::Io(_)
        )
    }

    /// Short stable label, used as a metric dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FrameTooShort { .. } => "too_short",
            Self::LengthMismatch { .. } => "length_mismatch",
            Self::ChecksumMismatch { .. } => "checksum",
            Self::FrameTooLong { .. } => "too_long",
            Self::UnexpectedStartMarker { .. } => "resync",
            Self::EmptyPayload => "empty",
            Self::UnknownMessageType(_) => "unknown_type",
            Self::TruncatedMessage { .. } => "truncated_message",
            Self::PayloadTooLarge { .. } => "payload_too_large",
            Self::StreamClosedMidFrame { .. } => "closed_mid_frame",
            Self::ReadTimeout { .. } => "timeout",
            Self::Io(_) => "io",
        }
    }
}

/// Result type for protocol operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;
