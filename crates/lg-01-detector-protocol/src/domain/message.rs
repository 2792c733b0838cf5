//! Typed detector messages
//!
//! The first DATA byte selects the message type:
//!
//! | Type | Layout after the type byte |
//! |------|----------------------------|
//! | `0x00` heartbeat | signal-source IPv4 (4 octets) |
//! | `0x01` vehicle detection | lane (1), plate (16, NUL/space padded), direction (1), queue length (2, BE), speed (1) |

use crate::error::{ProtocolError, ProtocolResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::LaneIndex;
use std::net::Ipv4Addr;

/// Heartbeat message type byte
pub const MSG_HEARTBEAT: u8 = 0x00;

/// Vehicle detection message type byte
pub const MSG_VEHICLE_DETECTION: u8 = 0x01;

/// Width of the plate field
pub const PLATE_FIELD_LEN: usize = 16;

/// Type byte + IPv4
pub const HEARTBEAT_LEN: usize = 1 + 4;

/// Type byte + lane + plate + direction + queue length + speed
pub const VEHICLE_RECORD_LEN: usize = 1 + 1 + PLATE_FIELD_LEN + 1 + 2 + 1;

/// Travel direction code: toward the sensor
pub const DIRECTION_TOWARD_SENSOR: u8 = 1;

/// Travel direction code: away from the sensor
pub const DIRECTION_AWAY_FROM_SENSOR: u8 = 2;

/// A vehicle detection record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleDetection {
    /// Lane index reported by the detector
    pub lane: LaneIndex,
    /// Plate text with wire padding removed; empty when no plate was read
    pub plate: String,
    /// Raw travel direction code
    pub direction_code: u8,
    /// Vehicles queued at the detector's approach
    pub queue_length: u16,
    /// Speed in km/h
    pub speed: u8,
    /// Receive time
    pub timestamp: DateTime<Utc>,
}

/// A decoded detector message
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DetectorFrame {
    /// Keep-alive from a signal source
    Heartbeat { signal_ip: Ipv4Addr },
    /// Vehicle passing a detection line
    VehicleDetection(VehicleDetection),
}

impl DetectorFrame {
    /// Parse verified DATA bytes into a typed message.
    pub fn parse(data: &[u8], received_at: DateTime<Utc>) -> ProtocolResult<Self> {
        let Some(&message_type) = data.first() else {
            return Err(ProtocolError::EmptyPayload);
        };

        match message_type {
            MSG_HEARTBEAT => {
                ensure_len("heartbeat", data, HEARTBEAT_LEN)?;
                Ok(Self::Heartbeat {
                    signal_ip: Ipv4Addr::new(data[1], data[2], data[3], data[4]),
                })
            }
            MSG_VEHICLE_DETECTION => {
                ensure_len("vehicle detection", data, VEHICLE_RECORD_LEN)?;
                let plate_end = 2 + PLATE_FIELD_LEN;
                Ok(Self::VehicleDetection(VehicleDetection {
                    lane: data[1],
                    plate: decode_plate(&data[2..plate_end]),
                    direction_code: data[plate_end],
                    queue_length: u16::from_be_bytes([data[plate_end + 1], data[plate_end + 2]]),
                    speed: data[plate_end + 3],
                    timestamp: received_at,
                }))
            }
            other => Err(ProtocolError::UnknownMessageType(other)),
        }
    }

    pub fn is_heartbeat(&self) -> bool {
        matches!(self, Self::Heartbeat { .. })
    }
}

/// Whether verified DATA bytes carry a heartbeat.
///
/// Checked before full parsing so the echo is not delayed by classification.
pub fn is_heartbeat_payload(data: &[u8]) -> bool {
    data.first() == Some(&MSG_HEARTBEAT)
}

/// Build the DATA bytes of a vehicle detection record.
///
/// Plates longer than the field are truncated at a character boundary.
pub fn encode_vehicle_record(
    lane: LaneIndex,
    plate: &str,
    direction_code: u8,
    queue_length: u16,
    speed: u8,
) -> Vec<u8> {
    let mut field = [0u8; PLATE_FIELD_LEN];
    let mut used = 0;
    for ch in plate.chars() {
        let width = ch.len_utf8();
        if used + width > PLATE_FIELD_LEN {
            break;
        }
        ch.encode_utf8(&mut field[used..used + width]);
        used += width;
    }

    let mut data = Vec::with_capacity(VEHICLE_RECORD_LEN);
    data.push(MSG_VEHICLE_DETECTION);
    data.push(lane);
    data.extend_from_slice(&field);
    data.push(direction_code);
    data.extend_from_slice(&queue_length.to_be_bytes());
    data.push(speed);
    data
}

fn ensure_len(kind: &'static str, data: &[u8], expected: usize) -> ProtocolResult<()> {
    if data.len() < expected {
        return Err(ProtocolError::TruncatedMessage {
            kind,
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

fn decode_plate(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_heartbeat() {
        let frame = DetectorFrame::parse(&[0x00, 10, 0, 0, 1], Utc::now()).unwrap();
        assert_eq!(
            frame,
            DetectorFrame::Heartbeat {
                signal_ip: Ipv4Addr::new(10, 0, 0, 1)
            }
        );
        assert!(frame.is_heartbeat());
    }

    #[test]
    fn test_parse_truncated_heartbeat() {
        let result = DetectorFrame::parse(&[0x00, 10, 0], Utc::now());
        assert!(matches!(
            result,
            Err(ProtocolError::TruncatedMessage {
                expected: 5,
                actual: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_vehicle_detection() {
        let now = Utc::now();
        let data = encode_vehicle_record(3, "ABC123", DIRECTION_AWAY_FROM_SENSOR, 4, 42);
        assert_eq!(data.len(), VEHICLE_RECORD_LEN);

        let DetectorFrame::VehicleDetection(detection) = DetectorFrame::parse(&data, now).unwrap()
        else {
            panic!("expected vehicle detection");
        };
        assert_eq!(detection.lane, 3);
        assert_eq!(detection.plate, "ABC123");
        assert_eq!(detection.direction_code, 2);
        assert_eq!(detection.queue_length, 4);
        assert_eq!(detection.speed, 42);
        assert_eq!(detection.timestamp, now);
    }

    #[test]
    fn test_plate_padding_removed() {
        let mut data = encode_vehicle_record(1, "", 1, 0, 0);
        data[2..6].copy_from_slice(b"X9  ");
        let DetectorFrame::VehicleDetection(detection) =
            DetectorFrame::parse(&data, Utc::now()).unwrap()
        else {
            panic!("expected vehicle detection");
        };
        assert_eq!(detection.plate, "X9");
    }

    #[test]
    fn test_multibyte_plate_truncated_on_char_boundary() {
        // 6 x 3-byte characters do not fit into 16 bytes; 5 do
        let data = encode_vehicle_record(1, "京京京京京京", 1, 0, 0);
        let DetectorFrame::VehicleDetection(detection) =
            DetectorFrame::parse(&data, Utc::now()).unwrap()
        else {
            panic!("expected vehicle detection");
        };
        assert_eq!(detection.plate, "京京京京京");
    }

    #[test]
    fn test_unknown_message_type() {
        let result = DetectorFrame::parse(&[0x09, 1, 2], Utc::now());
        assert!(matches!(result, Err(ProtocolError::UnknownMessageType(0x09))));
    }

    #[test]
    fn test_empty_payload() {
        assert!(matches!(
            DetectorFrame::parse(&[], Utc::now()),
            Err(ProtocolError::EmptyPayload)
        ));
        assert!(!is_heartbeat_payload(&[]));
        assert!(is_heartbeat_payload(&[0x00]));
    }
}
