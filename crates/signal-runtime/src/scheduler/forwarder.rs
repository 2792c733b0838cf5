//! Segment notification forwarder
//!
//! Turns segment notifications into system events and bus events. Runs on
//! its own task so a segment never waits on the system actor.

use super::system_actor::SystemHandle;
use lg_05_segment_control::SegmentNotification;
use lg_06_system_control::SystemEvent;
use shared_bus::{EventPublisher, InMemoryEventBus, SignalEvent};
use signal_telemetry::{CLEARANCE_VERDICTS, FORCED_CLEARS, SEGMENT_FAULTS, SEGMENT_TRANSITIONS};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

pub(crate) fn spawn(
    mut notifications: mpsc::UnboundedReceiver<SegmentNotification>,
    system: SystemHandle,
    bus: Arc<InMemoryEventBus>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let notification = tokio::select! {
                Some(n) = notifications.recv() => n,
                _ = shutdown.changed() => break,
                else => break,
            };
            forward(notification, &system, bus.as_ref()).await;
        }
        info!("[lg-05] Notification forwarder stopped");
    })
}

async fn forward(notification: SegmentNotification, system: &SystemHandle, bus: &InMemoryEventBus) {
    let (system_event, bus_event) = match notification {
        SegmentNotification::StateChanged {
            segment_id,
            from,
            to,
        } => {
            SEGMENT_TRANSITIONS
                .with_label_values(&[&segment_id.to_string(), &to.to_string()])
                .inc();
            // Clearance is re-established by the next evaluation
            (
                SystemEvent::SegmentClearance {
                    segment: segment_id,
                    cleared: false,
                },
                SignalEvent::SegmentStateChanged {
                    segment_id,
                    from,
                    to,
                },
            )
        }
        SegmentNotification::ClearanceEvaluated {
            segment_id,
            evaluation,
        } => {
            CLEARANCE_VERDICTS
                .with_label_values(&[&evaluation.decision.to_string()])
                .inc();
            if evaluation.force_clear {
                FORCED_CLEARS.inc();
            }
            (
                SystemEvent::SegmentClearance {
                    segment: segment_id,
                    cleared: evaluation.permits_switch(),
                },
                SignalEvent::ClearanceEvaluated {
                    segment_id,
                    decision: evaluation.decision,
                    force_clear: evaluation.force_clear,
                },
            )
        }
        SegmentNotification::Fault { segment_id, reason } => {
            SEGMENT_FAULTS
                .with_label_values(&[&segment_id.to_string()])
                .inc();
            error!(segment_id, %reason, "Segment fault escalated");
            let reason = reason.to_string();
            (
                SystemEvent::SegmentFault {
                    segment: segment_id,
                    reason: reason.clone(),
                },
                SignalEvent::SegmentFault { segment_id, reason },
            )
        }
    };

    bus.publish(bus_event).await;

    if let Err(e) = system.dispatch(system_event).await {
        warn!(error = %e, "Failed to forward segment notification");
    }
}
