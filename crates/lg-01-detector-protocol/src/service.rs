//! Detector Connection - per-socket read loop
//!
//! Reads bytes, decodes frames, echoes heartbeats and hands vehicle
//! detections to a [`FrameSink`]. Frame errors are logged and skipped; only
//! stream errors (timeout, I/O, close mid-frame) end the loop.

use crate::domain::{is_heartbeat_payload, DetectorFrame, FrameDecoder, FrameEncoder};
use crate::error::{ProtocolError, ProtocolResult};
use crate::ports::FrameSink;
use chrono::Utc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

/// Connection configuration
#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    /// Maximum silence before the connection is dropped
    pub read_timeout: Duration,
    /// Socket read buffer size
    pub read_buffer_size: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(30),
            read_buffer_size: 1024,
        }
    }
}

/// Per-connection counters, returned when the loop ends
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    pub bytes_read: u64,
    pub frames_decoded: u64,
    pub frame_errors: u64,
    pub heartbeats_echoed: u64,
    pub detections_forwarded: u64,
}

/// One detector connection
pub struct DetectorConnection<S> {
    stream: S,
    peer: String,
    decoder: FrameDecoder,
    encoder: FrameEncoder,
    config: ConnectionConfig,
    stats: ConnectionStats,
}

impl<S> DetectorConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S, peer: impl Into<String>, config: ConnectionConfig) -> Self {
        Self {
            stream,
            peer: peer.into(),
            decoder: FrameDecoder::new(),
            encoder: FrameEncoder::new(),
            config,
            stats: ConnectionStats::default(),
        }
    }

    /// Run until the peer disconnects or a stream error occurs.
    ///
    /// # Returns
    ///
    /// Counters on a clean close; the stream error otherwise.
    pub async fn run<K>(mut self, sink: &K) -> ProtocolResult<ConnectionStats>
    where
        K: FrameSink + ?Sized,
    {
        let mut buf = vec![0u8; self.config.read_buffer_size.max(1)];

        loop {
            let read = tokio::time::timeout(self.config.read_timeout, self.stream.read(&mut buf))
                .await
                .map_err(|_| ProtocolError::ReadTimeout {
                    after_ms: self.config.read_timeout.as_millis() as u64,
                })??;

            if read == 0 {
                if self.decoder.is_mid_frame() {
                    return Err(ProtocolError::StreamClosedMidFrame {
                        buffered: self.decoder.buffered(),
                    });
                }
                debug!(peer = %self.peer, "Detector closed connection");
                return Ok(self.stats);
            }
            self.stats.bytes_read += read as u64;

            for result in self.decoder.feed_slice(&buf[..read]) {
                match result {
                    Ok(data) => self.handle_data(&data, sink).await?,
                    Err(e) => {
                        self.stats.frame_errors += 1;
                        warn!(peer = %self.peer, error = %e, "Dropped detector frame");
                        sink.on_frame_error(&e);
                    }
                }
            }
        }
    }

    async fn handle_data<K>(&mut self, data: &[u8], sink: &K) -> ProtocolResult<()>
    where
        K: FrameSink + ?Sized,
    {
        self.stats.frames_decoded += 1;

        if is_heartbeat_payload(data) {
            // Echo first: the ack must not wait on parsing or routing
            let echo = self.encoder.encode(data)?;
            self.stream.write_all(&echo).await?;
            self.stream.flush().await?;
            self.stats.heartbeats_echoed += 1;
        }

        match DetectorFrame::parse(data, Utc::now()) {
            Ok(DetectorFrame::Heartbeat { signal_ip }) => {
                debug!(peer = %self.peer, %signal_ip, "Heartbeat echoed");
                sink.on_heartbeat(signal_ip);
            }
            Ok(DetectorFrame::VehicleDetection(detection)) => {
                debug!(
                    peer = %self.peer,
                    lane = detection.lane,
                    plate = %detection.plate,
                    direction = detection.direction_code,
                    "Vehicle detection"
                );
                self.stats.detections_forwarded += 1;
                sink.on_detection(detection).await;
            }
            Err(e) => {
                self.stats.frame_errors += 1;
                warn!(peer = %self.peer, error = %e, "Undecodable detector message");
                sink.on_frame_error(&e);
            }
        }
        Ok(())
    }
}
