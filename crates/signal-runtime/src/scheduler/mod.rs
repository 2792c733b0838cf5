//! # Event Scheduler
//!
//! One actor task per segment plus one for the system machine. Events for a
//! segment are handled strictly one at a time; critical commands overtake
//! queued work.
//!
//! ```text
//!  detectors ──► process_segment_event ──► [segment actor]*N
//!  timer ─────► tick ────────────────────►      │ notifications
//!                                               ▼
//!  operator ──► process_system_event ──► [system actor] ◄── forwarder ──► bus
//!                                               │
//!                                               └── command fan-out ──► segments
//! ```

mod error;
mod forwarder;
mod segment_actor;
mod system_actor;

pub use error::{SchedulerError, SchedulerResult};
pub use segment_actor::SegmentHandle;
pub use system_actor::{SystemHandle, SystemView};

use lg_05_segment_control::{SegmentNotification, SegmentSnapshot, SegmentStateMachine};
use lg_06_system_control::{SystemEvent, SystemStateMachine, SystemTransition};
use shared_bus::InMemoryEventBus;
use shared_types::{EventPayload, SegmentEvent, SegmentId};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Outcome of handing an event to an actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch<T> {
    /// Critical event; the actor already handled it.
    Completed(T),
    /// Queued for the actor.
    Queued,
}

impl<T> Dispatch<T> {
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Queued => None,
        }
    }
}

/// Entry point for all events.
#[derive(Clone)]
pub struct EventScheduler {
    segments: Arc<BTreeMap<SegmentId, SegmentHandle>>,
    system: SystemHandle,
}

impl EventScheduler {
    /// Spawn the segment actors, the system actor and the forwarder.
    pub fn start(
        machines: Vec<SegmentStateMachine>,
        system: SystemStateMachine,
        bus: Arc<InMemoryEventBus>,
        queue_capacity: usize,
        shutdown: watch::Receiver<bool>,
    ) -> (Self, Vec<JoinHandle<()>>) {
        let (notify_tx, notify_rx) = mpsc::unbounded_channel::<SegmentNotification>();
        let mut tasks = Vec::with_capacity(machines.len() + 2);

        let mut segments = BTreeMap::new();
        for machine in machines {
            let (handle, task) =
                segment_actor::spawn(machine, queue_capacity, notify_tx.clone(), shutdown.clone());
            segments.insert(handle.segment_id(), handle);
            tasks.push(task);
        }
        let segments = Arc::new(segments);

        let (system, task) = system_actor::spawn(
            system,
            Arc::clone(&segments),
            Arc::clone(&bus),
            queue_capacity,
            shutdown.clone(),
        );
        tasks.push(task);
        tasks.push(forwarder::spawn(notify_rx, system.clone(), bus, shutdown));

        info!(
            "[lg-05] Scheduler started with {} segment actor(s)",
            segments.len()
        );

        (Self { segments, system }, tasks)
    }

    /// Route a segment event to its actor.
    pub async fn process_segment_event(
        &self,
        segment_id: SegmentId,
        event: SegmentEvent,
        payload: EventPayload,
    ) -> SchedulerResult<Dispatch<Vec<SegmentNotification>>> {
        let handle = self
            .segments
            .get(&segment_id)
            .ok_or(SchedulerError::UnknownSegment(segment_id))?;
        handle.dispatch(event, payload).await
    }

    pub async fn process_system_event(
        &self,
        event: SystemEvent,
    ) -> SchedulerResult<Dispatch<Option<SystemTransition>>> {
        self.system.dispatch(event).await
    }

    /// Queue a timer tick for every machine. Ticks that find a full queue
    /// are skipped.
    pub fn tick(&self) {
        for (&segment_id, handle) in self.segments.iter() {
            if let Err(e) = handle.try_tick() {
                debug!(segment_id, error = %e, "Tick skipped");
            }
        }
        if let Err(e) = self.system.try_tick() {
            debug!(error = %e, "System tick skipped");
        }
    }

    pub fn segment_ids(&self) -> Vec<SegmentId> {
        self.segments.keys().copied().collect()
    }

    pub fn segment_snapshot(&self, segment_id: SegmentId) -> Option<SegmentSnapshot> {
        self.segments.get(&segment_id).map(SegmentHandle::snapshot)
    }

    pub fn segment_snapshots(&self) -> Vec<SegmentSnapshot> {
        self.segments.values().map(SegmentHandle::snapshot).collect()
    }

    pub fn system_view(&self) -> SystemView {
        self.system.view()
    }

    pub fn subscribe_system(&self) -> watch::Receiver<SystemView> {
        self.system.subscribe()
    }

    pub fn subscribe_segment(
        &self,
        segment_id: SegmentId,
    ) -> Option<watch::Receiver<SegmentSnapshot>> {
        self.segments.get(&segment_id).map(SegmentHandle::subscribe)
    }

    /// System summary followed by one line per segment.
    pub fn status_summary(&self) -> String {
        let mut out = self.system.view().summary;
        for snapshot in self.segment_snapshots() {
            let _ = write!(
                out,
                "\nSegment {} [{}]: up {} waiting {}, down {} waiting {}, health {}",
                snapshot.segment_id,
                snapshot.state,
                snapshot.upstream.vehicles.len(),
                snapshot.upstream.waiting,
                snapshot.downstream.vehicles.len(),
                snapshot.downstream.waiting,
                snapshot.health_score,
            );
        }
        out
    }
}
