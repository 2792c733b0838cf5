//! TCP accept loop for detector connections

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use super::detector::DetectorHandler;

/// Accept detectors until shutdown. Accept failures are logged and the loop
/// keeps going.
///
/// Connection tasks belong to the listener and are aborted when it stops.
pub async fn run_listener(
    listener: TcpListener,
    handler: DetectorHandler,
    mut shutdown: watch::Receiver<bool>,
) {
    let local: Option<SocketAddr> = listener.local_addr().ok();
    info!(addr = ?local, "[lg-01] Detector listener started");

    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    if let Err(e) = stream.set_nodelay(true) {
                        error!(%peer, error = %e, "Failed to set TCP_NODELAY");
                    }
                    connections.spawn(handler.serve(stream, peer.to_string()));
                }
                Err(e) => error!(error = %e, "Accept failed"),
            },
            Some(finished) = connections.join_next(), if !connections.is_empty() => {
                if let Err(e) = finished {
                    warn!(error = %e, "Detector connection task failed");
                }
            }
            _ = shutdown.changed() => {
                info!("[lg-01] Shutdown signal received");
                break;
            }
        }
    }

    let open = connections.len();
    connections.abort_all();
    while connections.join_next().await.is_some() {}
    handler.release_all();
    info!(closed = open, "[lg-01] Detector connections closed");
}
