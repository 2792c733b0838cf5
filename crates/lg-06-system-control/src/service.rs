//! System State Machine
//!
//! Coordinates all segments. Each handled event first updates flags, error
//! history and segment clearance, then the transition table is evaluated
//! once. A state change yields the [`SegmentCommand`] every segment must
//! receive.

use crate::domain::{
    health, FaultRecord, SegmentCommand, SystemConfig, SystemEvent, SystemSnapshot,
    SystemTransition, SystemVariables,
};
use crate::error::{SystemError, SystemResult};
use shared_types::{SegmentId, SystemState};
use std::fmt::Write as _;
use std::time::Instant;
use tracing::{debug, info, warn};

pub struct SystemStateMachine {
    config: SystemConfig,
    segments: Vec<SegmentId>,
    vars: SystemVariables,
}

impl SystemStateMachine {
    pub fn new(config: SystemConfig, segments: Vec<SegmentId>, now: Instant) -> SystemResult<Self> {
        if segments.is_empty() {
            return Err(SystemError::NoSegments);
        }
        let vars = SystemVariables::new(&segments, now);
        Ok(Self {
            config,
            segments,
            vars,
        })
    }

    pub fn state(&self) -> SystemState {
        self.vars.current_state
    }

    pub fn health_score(&self) -> u8 {
        self.vars.health_score
    }

    pub fn variables(&self) -> &SystemVariables {
        &self.vars
    }

    pub fn segments(&self) -> &[SegmentId] {
        &self.segments
    }

    /// Operator override of the health score.
    pub fn override_health(&mut self, score: u8) {
        warn!(from = self.vars.health_score, to = score, "Health score overridden");
        self.vars.health_score = score.min(health::MAX);
    }

    /// Process one event.
    ///
    /// # Returns
    ///
    /// The transition taken, if any. `SystemReset` always returns one.
    pub fn handle(
        &mut self,
        event: SystemEvent,
        now: Instant,
    ) -> SystemResult<Option<SystemTransition>> {
        debug!(event = event.name(), state = %self.vars.current_state, "System event");

        if event == SystemEvent::SystemReset {
            return Ok(Some(self.reset(now)));
        }

        self.record(&event, now)?;
        self.vars.errors_in_window(self.config.error_window, now);

        let next = self.next_state(&event, now);
        if next == self.vars.current_state {
            return Ok(None);
        }
        Ok(Some(self.enter(next, now)))
    }

    /// Apply the informational part of an event.
    fn record(&mut self, event: &SystemEvent, now: Instant) -> SystemResult<()> {
        match event {
            SystemEvent::SelfCheckPassed => self.vars.self_check_passed = true,
            SystemEvent::ConfigurationLoaded => self.vars.configuration_loaded = true,
            SystemEvent::SegmentClearance { segment, cleared } => {
                let slot = self
                    .vars
                    .segment_clearance
                    .get_mut(segment)
                    .ok_or(SystemError::UnknownSegment(*segment))?;
                *slot = *cleared;
            }
            SystemEvent::SegmentFault { segment, reason } => {
                if !self.vars.segment_clearance.contains_key(segment) {
                    return Err(SystemError::UnknownSegment(*segment));
                }
                self.record_error(format!("segment {segment}: {reason}"), now);
            }
            SystemEvent::FaultDetected { source } | SystemEvent::CriticalFault { source } => {
                self.record_error(source.clone(), now);
            }
            SystemEvent::CommunicationLost => {
                self.vars.communication_ok = false;
                self.record_error("communication lost".to_string(), now);
            }
            SystemEvent::CommunicationRestored => self.vars.communication_ok = true,
            SystemEvent::PowerLost => {
                self.vars.power_ok = false;
                self.record_error("power lost".to_string(), now);
            }
            SystemEvent::PowerRestored => self.vars.power_ok = true,
            _ => {}
        }
        Ok(())
    }

    fn record_error(&mut self, source: String, now: Instant) {
        warn!(%source, "System fault recorded");
        self.vars.errors.push_back(now);
        self.vars.adjust_health(health::ERROR);
        self.vars.last_fault = Some(FaultRecord { at: now, source });
    }

    /// Transition table
    fn next_state(&self, event: &SystemEvent, now: Instant) -> SystemState {
        use SystemState::*;
        let state = self.vars.current_state;

        match (state, event) {
            (EmergencyMode, _) | (MaintenanceMode, _) => state,
            (_, SystemEvent::CriticalFault { .. }) | (_, SystemEvent::ManualEmergency) => {
                EmergencyMode
            }

            (SystemInit, _) => {
                if self.init_complete(now) {
                    AllRedTransition
                } else {
                    SystemInit
                }
            }

            (AllRedTransition, _) => {
                let elapsed = self.vars.elapsed_in_state(now);
                if elapsed >= self.config.transition_duration && self.vars.all_segments_cleared() {
                    InductiveMode
                } else if elapsed > self.config.transition_timeout() {
                    DegradedMode
                } else {
                    AllRedTransition
                }
            }

            (InductiveMode, SystemEvent::FaultDetected { .. })
            | (InductiveMode, SystemEvent::ManualDegrade) => AllRedTransition,
            (InductiveMode, SystemEvent::SegmentFault { .. })
            | (InductiveMode, SystemEvent::CommunicationLost)
            | (InductiveMode, SystemEvent::PowerLost) => DegradedMode,
            (InductiveMode, SystemEvent::MaintenanceRequest)
            | (DegradedMode, SystemEvent::MaintenanceRequest) => MaintenanceMode,

            (DegradedMode, SystemEvent::ConditionsRestored)
            | (DegradedMode, SystemEvent::TimerTick) => {
                if self.recovery_ready(now) {
                    AllRedTransition
                } else {
                    DegradedMode
                }
            }

            (state, _) => state,
        }
    }

    fn init_complete(&self, now: Instant) -> bool {
        self.vars.self_check_passed
            && self.vars.configuration_loaded
            && self.vars.elapsed_in_state(now) >= self.config.min_init_delay
    }

    /// Recovery conditions for leaving DegradedMode.
    ///
    /// Expects the error history to be pruned to the window.
    pub fn recovery_ready(&self, now: Instant) -> bool {
        let stable = self
            .vars
            .fault_age(now)
            .map_or(true, |age| age >= self.config.stable_operation_time);
        let quiet = (self.vars.errors.len() as u64) < u64::from(self.config.error_threshold);
        let healthy = self.vars.health_score >= self.config.recovery_health_threshold;

        stable && quiet && healthy && self.vars.communication_ok && self.vars.power_ok
    }

    fn enter(&mut self, next: SystemState, now: Instant) -> SystemTransition {
        let from = self.vars.current_state;
        self.vars.current_state = next;
        self.vars.state_entered = now;
        self.vars.transitions += 1;
        self.vars.adjust_health(health::on_entry(next));

        info!(
            %from,
            to = %next,
            health = self.vars.health_score,
            "System transition"
        );

        SystemTransition {
            from,
            to: next,
            command: SegmentCommand::for_state(next),
        }
    }

    /// Back to SystemInit from any state.
    ///
    /// Self-check and configuration flags survive: they describe the
    /// installation, not the run.
    fn reset(&mut self, now: Instant) -> SystemTransition {
        let from = self.vars.current_state;
        let transitions = self.vars.transitions + 1;
        let self_check_passed = self.vars.self_check_passed;
        let configuration_loaded = self.vars.configuration_loaded;

        self.vars = SystemVariables::new(&self.segments, now);
        self.vars.self_check_passed = self_check_passed;
        self.vars.configuration_loaded = configuration_loaded;
        self.vars.transitions = transitions;

        info!(%from, "System reset");
        SystemTransition {
            from,
            to: SystemState::SystemInit,
            command: SegmentCommand::Reset,
        }
    }

    pub fn snapshot(&self, now: Instant) -> SystemSnapshot {
        SystemSnapshot {
            state: self.vars.current_state,
            state_elapsed_ms: self.vars.elapsed_in_state(now).as_millis() as u64,
            health_score: self.vars.health_score,
            self_check_passed: self.vars.self_check_passed,
            configuration_loaded: self.vars.configuration_loaded,
            communication_ok: self.vars.communication_ok,
            power_ok: self.vars.power_ok,
            last_fault_source: self.vars.last_fault.as_ref().map(|f| f.source.clone()),
            recent_errors: self.vars.errors.len(),
            segment_clearance: self.vars.segment_clearance.clone(),
            transitions: self.vars.transitions,
        }
    }

    /// Human-readable multi-line status.
    pub fn status_summary(&self, now: Instant) -> String {
        let mut out = String::new();
        let vars = &self.vars;
        let _ = writeln!(
            out,
            "System: {} ({}s)",
            vars.current_state,
            vars.elapsed_in_state(now).as_secs()
        );
        let _ = writeln!(out, "Health: {}/100", vars.health_score);
        let _ = writeln!(
            out,
            "Flags: self_check={} config={} communication={} power={}",
            vars.self_check_passed, vars.configuration_loaded, vars.communication_ok, vars.power_ok
        );
        match &vars.last_fault {
            Some(fault) => {
                let _ = writeln!(
                    out,
                    "Last fault: {} ({}s ago)",
                    fault.source,
                    now.saturating_duration_since(fault.at).as_secs()
                );
            }
            None => {
                let _ = writeln!(out, "Last fault: none");
            }
        }
        let _ = writeln!(out, "Recent errors: {}", vars.errors.len());
        for (segment, cleared) in &vars.segment_clearance {
            let status = if *cleared { "cleared" } else { "not cleared" };
            let _ = writeln!(out, "Segment {segment}: {status}");
        }
        out
    }
}
