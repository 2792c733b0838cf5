//! Driven Ports (SPI - Outbound Dependencies)

use crate::domain::VehicleDetection;
use crate::error::ProtocolError;
use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Receiver of decoded detector traffic
///
/// Implemented by the runtime to classify detections and route them to the
/// owning segment. Heartbeats are answered by the connection itself; the sink
/// only observes them.
#[async_trait]
pub trait FrameSink: Send + Sync {
    /// Deliver a vehicle detection.
    ///
    /// May await queue capacity, which applies backpressure to the socket.
    async fn on_detection(&self, detection: VehicleDetection);

    /// A heartbeat was received and echoed.
    fn on_heartbeat(&self, _signal_ip: Ipv4Addr) {}

    /// A frame was dropped.
    fn on_frame_error(&self, _error: &ProtocolError) {}
}
