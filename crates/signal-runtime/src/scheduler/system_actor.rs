//! System actor
//!
//! Owns the [`SystemStateMachine`]. Every transition fans its segment
//! command out to all segments before the next system event is taken.

use super::error::{SchedulerError, SchedulerResult};
use super::segment_actor::SegmentHandle;
use super::Dispatch;
use lg_06_system_control::{
    SystemEvent, SystemResult, SystemSnapshot, SystemStateMachine, SystemTransition,
};
use shared_bus::{EventPublisher, InMemoryEventBus, SignalEvent};
use shared_types::{EventPayload, SegmentId};
use signal_telemetry::{SYSTEM_HEALTH, SYSTEM_TRANSITIONS};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

const CRITICAL_QUEUE: usize = 16;

type SystemReply = oneshot::Sender<SystemResult<Option<SystemTransition>>>;

struct SystemJob {
    event: SystemEvent,
    reply: Option<SystemReply>,
}

/// Published after every system event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemView {
    pub snapshot: SystemSnapshot,
    pub summary: String,
}

#[derive(Clone)]
pub struct SystemHandle {
    critical_tx: mpsc::Sender<SystemJob>,
    normal_tx: mpsc::Sender<SystemJob>,
    view_rx: watch::Receiver<SystemView>,
}

impl SystemHandle {
    /// Critical events wait until the transition and its fan-out are done.
    pub async fn dispatch(
        &self,
        event: SystemEvent,
    ) -> SchedulerResult<Dispatch<Option<SystemTransition>>> {
        if event.priority().is_critical() {
            let (reply, response) = oneshot::channel();
            self.critical_tx
                .send(SystemJob {
                    event,
                    reply: Some(reply),
                })
                .await
                .map_err(|_| stopped())?;
            let transition = response.await.map_err(|_| stopped())??;
            return Ok(Dispatch::Completed(transition));
        }

        if event == SystemEvent::TimerTick {
            return self.try_tick().map(|()| Dispatch::Queued);
        }

        let job = SystemJob { event, reply: None };
        self.normal_tx.send(job).await.map_err(|_| stopped())?;
        Ok(Dispatch::Queued)
    }

    /// Queue a timer tick without waiting.
    pub fn try_tick(&self) -> SchedulerResult<()> {
        let job = SystemJob {
            event: SystemEvent::TimerTick,
            reply: None,
        };
        match self.normal_tx.try_send(job) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(SchedulerError::QueueFull {
                target: "system".into(),
            }),
            Err(TrySendError::Closed(_)) => Err(stopped()),
        }
    }

    pub fn view(&self) -> SystemView {
        self.view_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SystemView> {
        self.view_rx.clone()
    }
}

fn stopped() -> SchedulerError {
    SchedulerError::ActorStopped {
        target: "system".into(),
    }
}

struct SystemActor {
    machine: SystemStateMachine,
    segments: Arc<BTreeMap<SegmentId, SegmentHandle>>,
    bus: Arc<InMemoryEventBus>,
    critical_rx: mpsc::Receiver<SystemJob>,
    normal_rx: mpsc::Receiver<SystemJob>,
    view_tx: watch::Sender<SystemView>,
}

impl SystemActor {
    async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("[lg-06] System actor started");

        loop {
            let job = tokio::select! {
                biased;
                Some(job) = self.critical_rx.recv() => job,
                _ = shutdown.changed() => break,
                Some(job) = self.normal_rx.recv() => job,
                else => break,
            };
            self.process(job).await;
        }

        info!("[lg-06] System actor stopped");
    }

    async fn process(&mut self, job: SystemJob) {
        let now = Instant::now().into_std();
        let result = self.machine.handle(job.event.clone(), now);
        SYSTEM_HEALTH.set(i64::from(self.machine.health_score()));

        match &result {
            Ok(Some(transition)) => self.apply(*transition).await,
            Ok(None) => {}
            Err(e) => warn!(event = job.event.name(), error = %e, "System event rejected"),
        }

        let now = Instant::now().into_std();
        self.view_tx.send_replace(SystemView {
            snapshot: self.machine.snapshot(now),
            summary: self.machine.status_summary(now),
        });

        if let Some(reply) = job.reply {
            if reply.send(result).is_err() {
                debug!("Caller went away");
            }
        }
    }

    async fn apply(&self, transition: SystemTransition) {
        SYSTEM_TRANSITIONS
            .with_label_values(&[&transition.to.to_string()])
            .inc();
        self.bus
            .publish(SignalEvent::SystemStateChanged {
                from: transition.from,
                to: transition.to,
                health_score: self.machine.health_score(),
            })
            .await;

        let event = transition.command.segment_event();
        for (&segment_id, handle) in self.segments.iter() {
            if let Err(e) = handle
                .dispatch(event, EventPayload::for_segment(segment_id))
                .await
            {
                warn!(segment_id, ?event, error = %e, "Segment command failed");
            }
        }
        debug!(command = ?transition.command, "Segment command fanned out");
    }
}

pub(crate) fn spawn(
    machine: SystemStateMachine,
    segments: Arc<BTreeMap<SegmentId, SegmentHandle>>,
    bus: Arc<InMemoryEventBus>,
    queue_capacity: usize,
    shutdown: watch::Receiver<bool>,
) -> (SystemHandle, JoinHandle<()>) {
    let (critical_tx, critical_rx) = mpsc::channel(CRITICAL_QUEUE);
    let (normal_tx, normal_rx) = mpsc::channel(queue_capacity.max(1));
    let now = Instant::now().into_std();
    let (view_tx, view_rx) = watch::channel(SystemView {
        snapshot: machine.snapshot(now),
        summary: machine.status_summary(now),
    });

    SYSTEM_HEALTH.set(i64::from(machine.health_score()));

    let actor = SystemActor {
        machine,
        segments,
        bus,
        critical_rx,
        normal_rx,
        view_tx,
    };
    let task = tokio::spawn(actor.run(shutdown));

    (
        SystemHandle {
            critical_tx,
            normal_tx,
            view_rx,
        },
        task,
    )
}
