//! Per-segment actor
//!
//! Owns one [`SegmentStateMachine`]. Critical commands arrive on their own
//! channel and are always taken before queued work; everything else is
//! handled in arrival order.

use super::error::{SchedulerError, SchedulerResult};
use super::Dispatch;
use lg_05_segment_control::{
    SegmentNotification, SegmentResult, SegmentSnapshot, SegmentStateMachine,
};
use shared_types::{EventPayload, SegmentEvent, SegmentId};
use signal_telemetry::metrics::HistogramTimer;
use signal_telemetry::SEGMENT_EVENT_DURATION;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

const CRITICAL_QUEUE: usize = 16;

type SegmentReply = oneshot::Sender<SegmentResult<Vec<SegmentNotification>>>;

pub(crate) struct SegmentJob {
    event: SegmentEvent,
    payload: EventPayload,
    reply: Option<SegmentReply>,
}

/// Sending side of a segment actor.
#[derive(Clone)]
pub struct SegmentHandle {
    segment_id: SegmentId,
    critical_tx: mpsc::Sender<SegmentJob>,
    normal_tx: mpsc::Sender<SegmentJob>,
    snapshot_rx: watch::Receiver<SegmentSnapshot>,
}

impl SegmentHandle {
    pub fn segment_id(&self) -> SegmentId {
        self.segment_id
    }

    /// Critical events wait for the result; others are queued.
    ///
    /// A `TimerTick` that finds the queue full is dropped with
    /// [`SchedulerError::QueueFull`]: the next tick carries the same
    /// information.
    pub async fn dispatch(
        &self,
        event: SegmentEvent,
        payload: EventPayload,
    ) -> SchedulerResult<Dispatch<Vec<SegmentNotification>>> {
        if event.priority().is_critical() {
            let (reply, response) = oneshot::channel();
            let job = SegmentJob {
                event,
                payload,
                reply: Some(reply),
            };
            self.critical_tx
                .send(job)
                .await
                .map_err(|_| self.stopped())?;
            let notifications = response.await.map_err(|_| self.stopped())??;
            return Ok(Dispatch::Completed(notifications));
        }

        if event == SegmentEvent::TimerTick {
            return self.try_tick().map(|()| Dispatch::Queued);
        }

        let job = SegmentJob {
            event,
            payload,
            reply: None,
        };
        self.normal_tx.send(job).await.map_err(|_| self.stopped())?;
        Ok(Dispatch::Queued)
    }

    /// Queue a timer tick without waiting.
    pub fn try_tick(&self) -> SchedulerResult<()> {
        let job = SegmentJob {
            event: SegmentEvent::TimerTick,
            payload: EventPayload::for_segment(self.segment_id),
            reply: None,
        };
        match self.normal_tx.try_send(job) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(SchedulerError::QueueFull {
                target: format!("segment {}", self.segment_id),
            }),
            Err(TrySendError::Closed(_)) => Err(self.stopped()),
        }
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SegmentSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SegmentSnapshot> {
        self.snapshot_rx.clone()
    }

    fn stopped(&self) -> SchedulerError {
        SchedulerError::ActorStopped {
            target: format!("segment {}", self.segment_id),
        }
    }
}

struct SegmentActor {
    machine: SegmentStateMachine,
    critical_rx: mpsc::Receiver<SegmentJob>,
    normal_rx: mpsc::Receiver<SegmentJob>,
    snapshot_tx: watch::Sender<SegmentSnapshot>,
    notifications: mpsc::UnboundedSender<SegmentNotification>,
}

impl SegmentActor {
    async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let segment_id = self.machine.segment_id();
        info!("[lg-05] Segment {segment_id} actor started");

        loop {
            let job = tokio::select! {
                biased;
                Some(job) = self.critical_rx.recv() => job,
                _ = shutdown.changed() => break,
                Some(job) = self.normal_rx.recv() => job,
                else => break,
            };
            self.process(job);
        }

        info!("[lg-05] Segment {segment_id} actor stopped");
    }

    fn process(&mut self, job: SegmentJob) {
        let _timer = HistogramTimer::new(&SEGMENT_EVENT_DURATION);
        let now = Instant::now().into_std();

        let result = self.machine.handle(job.event, &job.payload, now);
        match &result {
            Ok(notifications) => {
                for notification in notifications {
                    // Receiver gone only during shutdown
                    let _ = self.notifications.send(notification.clone());
                }
            }
            Err(e) => warn!(
                segment_id = self.machine.segment_id(),
                event = ?job.event,
                error = %e,
                "Segment event rejected"
            ),
        }

        self.snapshot_tx.send_replace(self.machine.snapshot(now));

        if let Some(reply) = job.reply {
            if reply.send(result).is_err() {
                debug!(segment_id = self.machine.segment_id(), "Caller went away");
            }
        }
    }
}

/// Spawn the actor for `machine`.
pub(crate) fn spawn(
    machine: SegmentStateMachine,
    queue_capacity: usize,
    notifications: mpsc::UnboundedSender<SegmentNotification>,
    shutdown: watch::Receiver<bool>,
) -> (SegmentHandle, JoinHandle<()>) {
    let segment_id = machine.segment_id();
    let (critical_tx, critical_rx) = mpsc::channel(CRITICAL_QUEUE);
    let (normal_tx, normal_rx) = mpsc::channel(queue_capacity.max(1));
    let (snapshot_tx, snapshot_rx) =
        watch::channel(machine.snapshot(Instant::now().into_std()));

    let actor = SegmentActor {
        machine,
        critical_rx,
        normal_rx,
        snapshot_tx,
        notifications,
    };
    let task = tokio::spawn(actor.run(shutdown));

    let handle = SegmentHandle {
        segment_id,
        critical_tx,
        normal_tx,
        snapshot_rx,
    };
    (handle, task)
}
