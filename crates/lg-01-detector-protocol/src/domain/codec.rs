//! Frame codec for the detector byte stream
//!
//! ## Frame Format
//!
//! ```text
//! +------+------------------------------------------+------+
//! | 0x7E | escaped( LEN_HI LEN_LO DATA... CHECKSUM ) | 0x7D |
//! +------+------------------------------------------+------+
//! ```
//!
//! - LEN: big-endian, unescaped, `len(DATA) + 1`
//! - CHECKSUM: XOR of all DATA bytes
//! - Escaping: `0x5C` prefixes any literal `0x7E`, `0x7D` or `0x5C`

use crate::error::{ProtocolError, ProtocolResult};

/// Frame start marker
pub const START_MARKER: u8 = 0x7E;

/// Frame end marker
pub const END_MARKER: u8 = 0x7D;

/// Escape byte: the following byte is taken literally
pub const ESCAPE_BYTE: u8 = 0x5C;

/// Length field (2) + checksum (1)
pub const MIN_FRAME_BODY: usize = 3;

/// Upper bound on an unescaped frame body
pub const MAX_FRAME_BODY: usize = 4096;

/// XOR of all bytes.
pub fn xor_checksum(data: &[u8]) -> u8 {
    data.iter().fold(0, |acc, byte| acc ^ byte)
}

/// Whether a byte must be escaped on the wire.
fn needs_escape(byte: u8) -> bool {
    matches!(byte, START_MARKER | END_MARKER | ESCAPE_BYTE)
}

/// Escape a frame body for transmission.
pub fn escape(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + body.len() / 8);
    for &byte in body {
        if needs_escape(byte) {
            out.push(ESCAPE_BYTE);
        }
        out.push(byte);
    }
    out
}

/// Remove escaping from a frame body (markers already stripped).
///
/// A trailing lone escape byte is dropped.
pub fn unescape(escaped: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(escaped.len());
    let mut pending_escape = false;
    for &byte in escaped {
        if pending_escape {
            out.push(byte);
            pending_escape = false;
        } else if byte == ESCAPE_BYTE {
            pending_escape = true;
        } else {
            out.push(byte);
        }
    }
    out
}

/// Validate an unescaped frame body and return its DATA bytes.
///
/// Checks, in order: minimum size, declared length, checksum.
pub fn verify_body(body: &[u8]) -> ProtocolResult<&[u8]> {
    if body.len() < MIN_FRAME_BODY {
        return Err(ProtocolError::FrameTooShort { len: body.len() });
    }

    let declared = u16::from_be_bytes([body[0], body[1]]);
    if body.len() != usize::from(declared) + 2 {
        return Err(ProtocolError::LengthMismatch {
            declared,
            actual: body.len() - 2,
        });
    }

    let (data, checksum) = body[2..].split_at(body.len() - 3);
    let computed = xor_checksum(data);
    if computed != checksum[0] {
        return Err(ProtocolError::ChecksumMismatch {
            computed,
            received: checksum[0],
        });
    }

    Ok(data)
}

/// Frame encoder for outgoing messages
#[derive(Debug, Default)]
pub struct FrameEncoder;

impl FrameEncoder {
    pub const fn new() -> Self {
        Self
    }

    /// Build a complete wire frame around `data`.
    ///
    /// The length field and checksum are computed here; the body is escaped.
    pub fn encode(&self, data: &[u8]) -> ProtocolResult<Vec<u8>> {
        let declared = u16::try_from(data.len() + 1)
            .map_err(|_| ProtocolError::PayloadTooLarge { len: data.len() })?;

        let mut body = Vec::with_capacity(data.len() + MIN_FRAME_BODY);
        body.extend_from_slice(&declared.to_be_bytes());
        body.extend_from_slice(data);
        body.push(xor_checksum(data));

        let escaped = escape(&body);
        let mut frame = Vec::with_capacity(escaped.len() + 2);
        frame.push(START_MARKER);
        frame.extend_from_slice(&escaped);
        frame.push(END_MARKER);
        Ok(frame)
    }
}

/// Decoder state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    /// Skipping bytes until a start marker
    WaitStart,
    /// Collecting and unescaping body bytes
    InFrame,
}

/// Streaming frame decoder
///
/// Bytes can be fed in arbitrary chunks; state persists between calls.
#[derive(Debug)]
pub struct FrameDecoder {
    state: DecoderState,
    /// Unescaped body collected so far
    body: Vec<u8>,
    /// Previous byte was an escape byte
    escaped: bool,
    /// Bytes skipped outside of frames
    skipped: u64,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            state: DecoderState::WaitStart,
            body: Vec::with_capacity(64),
            escaped: false,
            skipped: 0,
        }
    }

    /// Reset decoder state
    pub fn reset(&mut self) {
        self.state = DecoderState::WaitStart;
        self.body.clear();
        self.escaped = false;
    }

    /// Whether a frame has been started but not finished.
    pub fn is_mid_frame(&self) -> bool {
        self.state == DecoderState::InFrame
    }

    /// Number of unescaped body bytes buffered for the current frame.
    pub fn buffered(&self) -> usize {
        self.body.len()
    }

    /// Bytes discarded while searching for a start marker.
    pub fn skipped_bytes(&self) -> u64 {
        self.skipped
    }

    /// Feed one byte.
    ///
    /// # Returns
    ///
    /// `Some(Ok(data))` when a frame completes and verifies, `Some(Err(_))`
    /// when a frame is dropped, `None` otherwise.
    pub fn feed(&mut self, byte: u8) -> Option<ProtocolResult<Vec<u8>>> {
        match self.state {
            DecoderState::WaitStart => {
                if byte == START_MARKER {
                    self.state = DecoderState::InFrame;
                    self.body.clear();
                    self.escaped = false;
                } else {
                    self.skipped += 1;
                }
                None
            }

            DecoderState::InFrame => {
                if self.escaped {
                    self.escaped = false;
                    return self.push(byte);
                }

                match byte {
                    ESCAPE_BYTE => {
                        self.escaped = true;
                        None
                    }
                    END_MARKER => {
                        let result = verify_body(&self.body).map(<[u8]>::to_vec);
                        self.reset();
                        Some(result)
                    }
                    START_MARKER => {
                        // Resynchronise on the new frame
                        let discarded = self.body.len();
                        self.body.clear();
                        Some(Err(ProtocolError::UnexpectedStartMarker { discarded }))
                    }
                    _ => self.push(byte),
                }
            }
        }
    }

    /// Feed a chunk of bytes and collect every completed or dropped frame.
    pub fn feed_slice(&mut self, bytes: &[u8]) -> Vec<ProtocolResult<Vec<u8>>> {
        bytes.iter().filter_map(|&byte| self.feed(byte)).collect()
    }

    fn push(&mut self, byte: u8) -> Option<ProtocolResult<Vec<u8>>> {
        if self.body.len() >= MAX_FRAME_BODY {
            self.reset();
            return Some(Err(ProtocolError::FrameTooLong {
                limit: MAX_FRAME_BODY,
            }));
        }
        self.body.push(byte);
        None
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heartbeat_data() -> Vec<u8> {
        vec![0x00, 10, 0, 0, 1]
    }

    #[test]
    fn test_checksum_of_heartbeat_data() {
        assert_eq!(xor_checksum(&heartbeat_data()), 11);
    }

    #[test]
    fn test_escape_prefixes_reserved_bytes() {
        for byte in [START_MARKER, END_MARKER, ESCAPE_BYTE] {
            assert_eq!(escape(&[byte]), vec![ESCAPE_BYTE, byte]);
        }
        assert_eq!(escape(&[0x01, 0x7F]), vec![0x01, 0x7F]);
    }

    #[test]
    fn test_unescape_inverts_escape() {
        let body: Vec<u8> = vec![0x00, 0x7E, 0x5C, 0x7D, 0x12, 0x5C, 0x5C];
        assert_eq!(unescape(&escape(&body)), body);
    }

    #[test]
    fn test_encode_heartbeat() {
        let frame = FrameEncoder::new().encode(&heartbeat_data()).unwrap();
        assert_eq!(
            frame,
            vec![0x7E, 0x00, 0x06, 0x00, 0x0A, 0x00, 0x00, 0x01, 0x0B, 0x7D]
        );
    }

    #[test]
    fn test_decode_length_mismatch() {
        let mut decoder = FrameDecoder::new();
        let results = decoder.feed_slice(&[0x7E, 0x00, 0x04, 0x01, 0xFF, 0x7D]);
        assert_eq!(results.len(), 1);
        assert!(matches!(
            results[0],
            Err(ProtocolError::LengthMismatch {
                declared: 4,
                actual: 2
            })
        ));
        // Decoder is ready for the next frame
        assert!(!decoder.is_mid_frame());
    }

    #[test]
    fn test_decode_too_short() {
        let mut decoder = FrameDecoder::new();
        let results = decoder.feed_slice(&[0x7E, 0x00, 0x01, 0x7D]);
        assert!(matches!(
            results[0],
            Err(ProtocolError::FrameTooShort { len: 2 })
        ));
    }

    #[test]
    fn test_decode_checksum_mismatch() {
        let mut frame = FrameEncoder::new().encode(&heartbeat_data()).unwrap();
        let checksum_index = frame.len() - 2;
        frame[checksum_index] ^= 0x01;

        let results = FrameDecoder::new().feed_slice(&frame);
        assert!(matches!(
            results[0],
            Err(ProtocolError::ChecksumMismatch {
                computed: 11,
                received: 10
            })
        ));
    }

    #[test]
    fn test_single_bit_flip_fails_verification() {
        let data: Vec<u8> = vec![0x01, 0x03, b'A', b'B', 0x7E, 0x5C];
        let mut body = Vec::new();
        body.extend_from_slice(&((data.len() + 1) as u16).to_be_bytes());
        body.extend_from_slice(&data);
        body.push(xor_checksum(&data));
        assert!(verify_body(&body).is_ok());

        for index in 2..body.len() - 1 {
            for bit in 0..8 {
                let mut mutated = body.clone();
                mutated[index] ^= 1 << bit;
                assert!(
                    matches!(
                        verify_body(&mutated),
                        Err(ProtocolError::ChecksumMismatch { .. })
                    ),
                    "flip of bit {bit} at {index} went unnoticed"
                );
            }
        }
    }

    #[test]
    fn test_decode_escaped_payload() {
        let data = vec![0x01, 0x7E, 0x7D, 0x5C, 0x02];
        let frame = FrameEncoder::new().encode(&data).unwrap();

        let results = FrameDecoder::new().feed_slice(&frame);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].as_ref().unwrap(), &data);
    }

    #[test]
    fn test_decode_across_chunks() {
        let frame = FrameEncoder::new().encode(&heartbeat_data()).unwrap();
        let mut decoder = FrameDecoder::new();

        let (first, second) = frame.split_at(4);
        assert!(decoder.feed_slice(first).is_empty());
        assert!(decoder.is_mid_frame());

        let results = decoder.feed_slice(second);
        assert_eq!(results[0].as_ref().unwrap(), &heartbeat_data());
    }

    #[test]
    fn test_garbage_before_start_is_skipped() {
        let mut stream = vec![0x01, 0x02, 0x7D, 0x5C];
        stream.extend(FrameEncoder::new().encode(&heartbeat_data()).unwrap());

        let mut decoder = FrameDecoder::new();
        let results = decoder.feed_slice(&stream);
        assert_eq!(results.len(), 1);
        assert!(results[0].is_ok());
        assert_eq!(decoder.skipped_bytes(), 4);
    }

    #[test]
    fn test_start_marker_mid_frame_resyncs() {
        let good = FrameEncoder::new().encode(&heartbeat_data()).unwrap();
        let mut stream = vec![0x7E, 0x00, 0x09, 0x01];
        stream.extend(&good);

        let results = FrameDecoder::new().feed_slice(&stream);
        assert_eq!(results.len(), 2);
        assert!(matches!(
            results[0],
            Err(ProtocolError::UnexpectedStartMarker { discarded: 3 })
        ));
        assert_eq!(results[1].as_ref().unwrap(), &heartbeat_data());
    }

    #[test]
    fn test_error_then_valid_frame() {
        let mut stream = vec![0x7E, 0x00, 0x04, 0x01, 0xFF, 0x7D];
        stream.extend(FrameEncoder::new().encode(&heartbeat_data()).unwrap());

        let results = FrameDecoder::new().feed_slice(&stream);
        assert!(results[0].is_err());
        assert!(results[1].is_ok());
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let mut decoder = FrameDecoder::new();
        decoder.feed(START_MARKER);
        let mut last = None;
        for _ in 0..=MAX_FRAME_BODY {
            last = decoder.feed(0x11);
        }
        assert!(matches!(last, Some(Err(ProtocolError::FrameTooLong { .. }))));
        assert!(!decoder.is_mid_frame());
    }
}
