//! # Detector Handler
//!
//! Bridges decoded detector traffic into the scheduler. Each accepted
//! connection runs on its own task; the connection table tracks who is
//! currently attached.

use std::future::Future;
use std::net::Ipv4Addr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use lg_01_detector_protocol::{
    ConnectionConfig, DetectorConnection, FrameSink, ProtocolError, VehicleDetection,
};
use lg_02_vehicle_classifier::VehicleClassifier;
use shared_bus::{EventPublisher, InMemoryEventBus, SignalEvent};
use signal_telemetry::{
    CLASSIFY_DROPS, DETECTOR_CONNECTIONS, FRAMES_DECODED, FRAME_ERRORS, HEARTBEATS_ECHOED,
    VEHICLE_EVENTS,
};

use crate::scheduler::EventScheduler;

/// A connected detector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub peer: String,
    pub connected_at: DateTime<Utc>,
}

/// Classifies detections and routes them to their segment.
pub struct DetectorRouter {
    classifier: Arc<VehicleClassifier>,
    scheduler: EventScheduler,
}

impl DetectorRouter {
    pub fn new(classifier: Arc<VehicleClassifier>, scheduler: EventScheduler) -> Self {
        Self {
            classifier,
            scheduler,
        }
    }
}

#[async_trait]
impl FrameSink for DetectorRouter {
    async fn on_detection(&self, detection: VehicleDetection) {
        FRAMES_DECODED.inc();

        let classified = match self.classifier.classify(&detection) {
            Ok(classified) => classified,
            Err(drop) => {
                CLASSIFY_DROPS.with_label_values(&[drop.reason()]).inc();
                return;
            }
        };

        VEHICLE_EVENTS
            .with_label_values(&[classified.event.name()])
            .inc();

        // Awaiting the queue here slows the socket down instead of dropping
        if let Err(e) = self
            .scheduler
            .process_segment_event(classified.segment_id, classified.event, classified.payload)
            .await
        {
            warn!(
                segment_id = classified.segment_id,
                error = %e,
                "Vehicle event not scheduled"
            );
        }
    }

    fn on_heartbeat(&self, signal_ip: Ipv4Addr) {
        FRAMES_DECODED.inc();
        HEARTBEATS_ECHOED.inc();
        debug!(%signal_ip, "Detector heartbeat");
    }

    fn on_frame_error(&self, error: &ProtocolError) {
        FRAME_ERRORS.with_label_values(&[error.kind()]).inc();
    }
}

/// Tracks live detector connections. Clones share the connection table.
#[derive(Clone)]
pub struct DetectorHandler {
    router: Arc<DetectorRouter>,
    bus: Arc<InMemoryEventBus>,
    config: ConnectionConfig,
    connections: Arc<DashMap<String, ConnectionInfo>>,
}

impl DetectorHandler {
    pub fn new(
        router: Arc<DetectorRouter>,
        bus: Arc<InMemoryEventBus>,
        config: ConnectionConfig,
    ) -> Self {
        Self {
            router,
            bus,
            config,
            connections: Arc::new(DashMap::new()),
        }
    }

    /// Currently attached detectors.
    pub fn connections(&self) -> Vec<ConnectionInfo> {
        self.connections.iter().map(|e| e.value().clone()).collect()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Forget every tracked connection, for tasks that were aborted before
    /// they could remove themselves.
    pub fn release_all(&self) {
        self.connections.clear();
        DETECTOR_CONNECTIONS.set(0);
    }

    /// Serve one detector stream on a new task.
    pub fn spawn_connection<S>(&self, stream: S, peer: String) -> JoinHandle<()>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        tokio::spawn(self.serve(stream, peer))
    }

    /// Future serving one detector stream until it closes.
    pub fn serve<S>(&self, stream: S, peer: String) -> impl Future<Output = ()> + Send + 'static
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let router = Arc::clone(&self.router);
        let bus = Arc::clone(&self.bus);
        let connections = Arc::clone(&self.connections);
        let config = self.config.clone();

        async move {
            connections.insert(
                peer.clone(),
                ConnectionInfo {
                    peer: peer.clone(),
                    connected_at: Utc::now(),
                },
            );
            DETECTOR_CONNECTIONS.set(connections.len() as i64);
            info!(%peer, "Detector connected");
            bus.publish(SignalEvent::DetectorConnected { peer: peer.clone() })
                .await;

            let result = DetectorConnection::new(stream, peer.clone(), config)
                .run(router.as_ref())
                .await;

            connections.remove(&peer);
            DETECTOR_CONNECTIONS.set(connections.len() as i64);

            let error = match result {
                Ok(stats) => {
                    info!(
                        %peer,
                        frames = stats.frames_decoded,
                        errors = stats.frame_errors,
                        detections = stats.detections_forwarded,
                        "Detector disconnected"
                    );
                    None
                }
                Err(e) => {
                    warn!(%peer, kind = e.kind(), error = %e, "Detector connection failed");
                    Some(e.to_string())
                }
            };
            bus.publish(SignalEvent::DetectorDisconnected { peer, error })
                .await;
        }
    }
}
