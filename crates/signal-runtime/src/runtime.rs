//! # Controller Runtime
//!
//! Wires the container, the scheduler and the handler tasks together.
//!
//! ## Startup Sequence
//!
//! 1. Build meeting zones, classifier and event bus
//! 2. Build the state machines and start the scheduler
//! 3. Bind the detector listener and start the timer
//! 4. Report `ConfigurationLoaded` and the self-check result to the system

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{info, warn};

use lg_06_system_control::SystemEvent;

use crate::container::{SignalConfig, SignalContainer};
use crate::handlers::{run_listener, run_timer, DetectorHandler, DetectorRouter};
use crate::scheduler::EventScheduler;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

pub struct SignalRuntime {
    container: SignalContainer,
    scheduler: Option<EventScheduler>,
    local_addr: Option<SocketAddr>,
    tasks: Vec<JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl SignalRuntime {
    pub fn new(config: SignalConfig) -> Result<Self> {
        info!("Creating LaneGuard runtime");
        let container = SignalContainer::new(config).context("Failed to build meeting zones")?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            container,
            scheduler: None,
            local_addr: None,
            tasks: Vec::new(),
            shutdown_tx,
            shutdown_rx,
        })
    }

    pub async fn start(&mut self) -> Result<()> {
        info!("===========================================");
        info!("  LaneGuard Signal Controller v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        let config = &self.container.config;
        let now = Instant::now().into_std();
        let machines = self.container.build_segments(now);
        let system = self
            .container
            .build_system(now)
            .context("Failed to build system state machine")?;

        let (scheduler, tasks) = EventScheduler::start(
            machines,
            system,
            self.container.event_bus.clone(),
            config.scheduler.queue_capacity,
            self.shutdown_rx.clone(),
        );
        self.tasks.extend(tasks);

        let listener = TcpListener::bind(&config.detector.listen_addr)
            .await
            .with_context(|| format!("Failed to bind {}", config.detector.listen_addr))?;
        self.local_addr = listener.local_addr().ok();

        let router = std::sync::Arc::new(DetectorRouter::new(
            self.container.classifier.clone(),
            scheduler.clone(),
        ));
        let handler = DetectorHandler::new(
            router,
            self.container.event_bus.clone(),
            config.connection_config(),
        );
        self.tasks.push(tokio::spawn(run_listener(
            listener,
            handler,
            self.shutdown_rx.clone(),
        )));
        self.tasks.push(tokio::spawn(run_timer(
            scheduler.clone(),
            config.tick_interval(),
            self.shutdown_rx.clone(),
        )));

        scheduler
            .process_system_event(SystemEvent::ConfigurationLoaded)
            .await
            .context("System actor unavailable")?;
        if self.self_check(&scheduler) {
            scheduler
                .process_system_event(SystemEvent::SelfCheckPassed)
                .await
                .context("System actor unavailable")?;
        } else {
            warn!("Self-check failed, system stays in SYSTEM_INIT");
        }

        info!("Detector port: {:?}", self.local_addr);
        info!("Segments: {:?}", scheduler.segment_ids());
        self.scheduler = Some(scheduler);
        Ok(())
    }

    /// Every configured segment has an actor and a registered zone.
    fn self_check(&self, scheduler: &EventScheduler) -> bool {
        let expected = self.container.config.segment_ids();
        expected == scheduler.segment_ids() && self.container.zones.len() == expected.len()
    }

    pub fn scheduler(&self) -> Option<&EventScheduler> {
        self.scheduler.as_ref()
    }

    pub fn container(&self) -> &SignalContainer {
        &self.container
    }

    /// Address the detector listener is bound to, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub async fn shutdown(mut self) {
        info!("Initiating graceful shutdown...");
        let _ = self.shutdown_tx.send(true);

        for task in self.tasks.drain(..) {
            if tokio::time::timeout(SHUTDOWN_GRACE, task).await.is_err() {
                warn!("Task did not stop within the grace period");
            }
        }

        info!("Shutdown complete");
    }
}
