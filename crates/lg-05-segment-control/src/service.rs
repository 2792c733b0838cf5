//! Segment State Machine
//!
//! One instance per segment, driven by a single task. Every call takes the
//! current time so transitions are deterministic under test.
//!
//! ## Event handling
//!
//! 1. Apply the event (vehicle bookkeeping, sensor map, command).
//! 2. Evaluate the guards of the resulting state once.
//!
//! Vehicle ID inconsistencies never fail a call; they lower the health score
//! and, after enough of them, raise a fault notification.

use crate::domain::{
    choose_green_side, command_target, health, may_leave_green, DirectionSnapshot, GreenGuard,
    SegmentConfig, SegmentFaultReason, SegmentNotification, SegmentSnapshot, SegmentVariables,
};
use crate::error::{SegmentError, SegmentResult};
use lg_03_meeting_zones::{MeetingZoneApi, ZoneError};
use lg_04_clearance::ClearanceEngine;
use shared_types::{
    ClearanceDecision, EventPayload, Movement, PlateId, SegmentEvent, SegmentId, SegmentState,
    Side, SignalAspect, ZoneId,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Options of one guard evaluation
#[derive(Debug, Clone, Copy, Default)]
struct Step {
    max_green_reached: bool,
    max_red_reached: bool,
    force_clear: bool,
}

pub struct SegmentStateMachine {
    segment_id: SegmentId,
    zone_id: ZoneId,
    config: SegmentConfig,
    vars: SegmentVariables,
    clearance: ClearanceEngine,
    zones: Arc<dyn MeetingZoneApi>,
}

impl SegmentStateMachine {
    /// Create a segment in held all-red.
    ///
    /// The meeting zone `zone_id` must already be registered.
    pub fn new(
        segment_id: SegmentId,
        zone_id: ZoneId,
        config: SegmentConfig,
        zones: Arc<dyn MeetingZoneApi>,
        now: Instant,
    ) -> Self {
        let clearance = ClearanceEngine::new(config.conservative_clear);
        Self {
            segment_id,
            zone_id,
            config,
            vars: SegmentVariables::new(now),
            clearance,
            zones,
        }
    }

    pub fn segment_id(&self) -> SegmentId {
        self.segment_id
    }

    pub fn state(&self) -> SegmentState {
        self.vars.current_state
    }

    pub fn variables(&self) -> &SegmentVariables {
        &self.vars
    }

    pub fn aspect(&self, side: Side) -> SignalAspect {
        self.vars.current_state.aspect_for(side)
    }

    /// Process one event.
    ///
    /// # Errors
    ///
    /// Malformed input only: a payload for another segment, a vehicle event
    /// without plate, or a missing meeting zone.
    pub fn handle(
        &mut self,
        event: SegmentEvent,
        payload: &EventPayload,
        now: Instant,
    ) -> SegmentResult<Vec<SegmentNotification>> {
        if payload.segment_id != self.segment_id {
            return Err(SegmentError::WrongSegment {
                expected: self.segment_id,
                got: payload.segment_id,
            });
        }

        let mut out = Vec::new();
        let mut step = Step::default();

        match event {
            SegmentEvent::VehicleEnterUpstream
            | SegmentEvent::VehicleExitUpstream
            | SegmentEvent::VehicleEnterDownstream
            | SegmentEvent::VehicleExitDownstream => {
                let plate = payload.plate.clone().ok_or(SegmentError::MissingPlate(event))?;
                if let Some((side, movement)) = event.vehicle_movement() {
                    match movement {
                        Movement::Enter => self.vehicle_enter(side, plate)?,
                        Movement::Exit => self.vehicle_exit(side, &plate, &mut out)?,
                    }
                }
            }
            SegmentEvent::TimerTick => {}
            SegmentEvent::GreenTimeout => step.max_green_reached = true,
            SegmentEvent::ClearTimeout => step.max_red_reached = true,
            SegmentEvent::ConservativeClearTriggered => step.force_clear = true,
            SegmentEvent::SensorFault | SegmentEvent::SensorRecovered => {
                self.update_sensor(event, payload);
            }
            SegmentEvent::ForceSwitch => {
                debug!(segment_id = self.segment_id, "Switch requested");
                self.vars.pending_force_switch = true;
            }
            SegmentEvent::HoldAllRed
            | SegmentEvent::ResumeInductive
            | SegmentEvent::ManualYellowFlash
            | SegmentEvent::ReleaseControl
            | SegmentEvent::SystemReset => self.apply_command(event, now, &mut out)?,
        }

        self.step(step, now, &mut out)?;
        Ok(out)
    }

    /// Read-only status view.
    pub fn snapshot(&self, now: Instant) -> SegmentSnapshot {
        let direction = |side: Side| {
            let flow = self.vars.flow(side);
            let mut vehicles: Vec<PlateId> = flow.plates.iter().cloned().collect();
            vehicles.sort();
            DirectionSnapshot {
                vehicles,
                in_count: flow.in_count,
                out_count: flow.out_count,
                waiting: self.zones.count(self.zone_id, side).unwrap_or(0)
                    + self.vars.overflow(side).len(),
            }
        };

        SegmentSnapshot {
            segment_id: self.segment_id,
            state: self.vars.current_state,
            hold: self.vars.hold,
            phase_elapsed_ms: now.saturating_duration_since(self.vars.phase_start).as_millis()
                as u64,
            upstream: direction(Side::Upstream),
            downstream: direction(Side::Downstream),
            health_score: self.vars.health_score,
            consecutive_errors: self.vars.consecutive_errors,
            id_logic_errors: self.vars.id_logic_errors,
            last_decision: self.vars.last_decision,
            faulted_sensors: self.vars.faulted_sensors.iter().cloned().collect(),
        }
    }

    // =========================================================================
    // VEHICLES
    // =========================================================================

    /// Admit a vehicle into the flow of `side` only while that side may
    /// enter; otherwise it waits in the meeting area (or the overflow set
    /// when the area is full) and is admitted when `side` is granted green.
    fn vehicle_enter(&mut self, side: Side, plate: PlateId) -> SegmentResult<()> {
        let admit_directly = match self.vars.current_state {
            SegmentState::YellowFlashManual | SegmentState::NoCtrl => true,
            SegmentState::AllRedClear => self.vars.late_admission == Some(side),
            green => green.green_side() == Some(side),
        };

        if admit_directly {
            if self.vars.flow_mut(side).admit(plate.clone()) {
                debug!(segment_id = self.segment_id, %side, %plate, "Vehicle entered");
            }
            return Ok(());
        }

        // No right-of-way: the vehicle waits and becomes a request
        match self.zones.vehicle_enter(self.zone_id, side, plate.clone()) {
            Ok(_) => {
                debug!(segment_id = self.segment_id, %side, %plate, "Vehicle waiting");
                Ok(())
            }
            Err(ZoneError::CapacityExceeded { capacity, .. }) => {
                warn!(
                    segment_id = self.segment_id,
                    %side,
                    %plate,
                    capacity,
                    "Meeting area full, vehicle waits in overflow"
                );
                self.vars.overflow_mut(side).insert(plate);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn vehicle_exit(
        &mut self,
        side: Side,
        plate: &PlateId,
        out: &mut Vec<SegmentNotification>,
    ) -> SegmentResult<()> {
        // A waiting vehicle that leaves no longer requests right-of-way
        self.zones.vehicle_exit(self.zone_id, side, plate)?;
        self.vars.overflow_mut(side).remove(plate);

        if self.vars.flow_mut(side).release(plate) {
            debug!(segment_id = self.segment_id, %side, %plate, "Vehicle exited");
        } else {
            warn!(
                segment_id = self.segment_id,
                %side,
                %plate,
                "Exit without matching entry"
            );
            self.record_logic_errors(1, out);
        }
        Ok(())
    }

    fn record_logic_errors(&mut self, count: u64, out: &mut Vec<SegmentNotification>) {
        if count == 0 {
            return;
        }
        let threshold = self.config.error_escalation_threshold;
        for _ in 0..count {
            self.vars.id_logic_errors += 1;
            self.vars.consecutive_errors += 1;
            self.vars.adjust_health(health::ID_LOGIC_ERROR);

            if threshold > 0 && self.vars.consecutive_errors == threshold {
                self.raise_fault(
                    SegmentFaultReason::ConsecutiveLogicErrors { count: threshold },
                    out,
                );
            }
        }
    }

    fn update_sensor(&mut self, event: SegmentEvent, payload: &EventPayload) {
        let sensor = payload
            .sensor_id
            .clone()
            .unwrap_or_else(|| format!("segment-{}", self.segment_id));

        if event == SegmentEvent::SensorFault {
            if self.vars.faulted_sensors.insert(sensor.clone()) {
                warn!(segment_id = self.segment_id, %sensor, "Sensor faulted");
            }
        } else if self.vars.faulted_sensors.remove(&sensor) {
            info!(segment_id = self.segment_id, %sensor, "Sensor recovered");
        }
    }

    // =========================================================================
    // COMMANDS
    // =========================================================================

    fn apply_command(
        &mut self,
        command: SegmentEvent,
        now: Instant,
        out: &mut Vec<SegmentNotification>,
    ) -> SegmentResult<()> {
        let Some(target) = command_target(self.vars.current_state, command) else {
            return Ok(());
        };

        match command {
            SegmentEvent::SystemReset => {
                info!(segment_id = self.segment_id, "Segment reset");
                self.zones.clear_zone(self.zone_id)?;
                self.clearance.reset();

                let from = self.vars.current_state;
                self.vars = SegmentVariables::new(now);
                if from != target {
                    out.push(SegmentNotification::StateChanged {
                        segment_id: self.segment_id,
                        from,
                        to: target,
                    });
                }
                return Ok(());
            }
            SegmentEvent::ResumeInductive => {
                if self.vars.current_state.is_manual() {
                    debug!(
                        segment_id = self.segment_id,
                        state = %self.vars.current_state,
                        "Resume ignored in manual state"
                    );
                } else {
                    self.vars.hold = false;
                }
                return Ok(());
            }
            _ => {}
        }

        self.vars.hold = true;
        if target != self.vars.current_state {
            self.transition(target, now, out);
        }
        Ok(())
    }

    // =========================================================================
    // GUARDS
    // =========================================================================

    fn step(&mut self, step: Step, now: Instant, out: &mut Vec<SegmentNotification>) -> SegmentResult<()> {
        match self.vars.current_state {
            SegmentState::UpstreamGreen | SegmentState::DownstreamGreen => {
                self.step_green(step, now, out)
            }
            SegmentState::AllRedClear => self.step_all_red(step, now, out),
            SegmentState::YellowFlashManual | SegmentState::NoCtrl => Ok(()),
        }
    }

    fn step_green(
        &mut self,
        step: Step,
        now: Instant,
        out: &mut Vec<SegmentNotification>,
    ) -> SegmentResult<()> {
        let Some(side) = self.vars.current_state.green_side() else {
            return Ok(());
        };

        let guard = GreenGuard {
            elapsed: now.saturating_duration_since(self.vars.phase_start),
            opposing_request: self.vars.pending_force_switch
                || self.waiting(side.opposite())? > 0,
            current_flow: !self.vars.flow(side).plates.is_empty(),
            max_green_reached: step.max_green_reached,
        };

        if may_leave_green(&self.config, &guard) {
            self.transition(SegmentState::AllRedClear, now, out);
        }
        Ok(())
    }

    fn step_all_red(
        &mut self,
        step: Step,
        now: Instant,
        out: &mut Vec<SegmentNotification>,
    ) -> SegmentResult<()> {
        let mut evaluation = self.clearance.evaluate(
            &self.vars.upstream.view(),
            &self.vars.downstream.view(),
            self.vars.any_sensor_faulted(),
            now,
        );

        if !evaluation.decision.is_clear() && (evaluation.force_clear || step.force_clear) {
            self.force_clear(out);
            evaluation.force_clear = true;
        } else if evaluation.decision == ClearanceDecision::Safe
            && self.vars.last_decision != Some(ClearanceDecision::Safe)
        {
            self.vars.adjust_health(health::CLEAN_CLEARANCE);
            self.vars.consecutive_errors = 0;
        }

        if self.vars.last_decision != Some(evaluation.decision)
            || self.vars.last_force_clear != evaluation.force_clear
        {
            debug!(
                segment_id = self.segment_id,
                decision = %evaluation.decision,
                forced = evaluation.force_clear,
                "Clearance evaluated"
            );
            out.push(SegmentNotification::ClearanceEvaluated {
                segment_id: self.segment_id,
                evaluation,
            });
        }
        self.vars.last_decision = Some(evaluation.decision);
        self.vars.last_force_clear = evaluation.force_clear;

        if evaluation.permits_switch() {
            if !self.vars.hold {
                self.grant_green(now, out)?;
            }
            return Ok(());
        }

        let waited = now.saturating_duration_since(self.vars.phase_start);
        let max_red = step.max_red_reached || waited >= self.config.max_red;
        if max_red && !self.vars.hold && !self.vars.max_red_fault_raised {
            self.vars.max_red_fault_raised = true;
            self.vars.adjust_health(health::MAX_RED_FAULT);
            self.raise_fault(SegmentFaultReason::MaxRedExceeded { waited }, out);
        }
        Ok(())
    }

    /// Conservative clear: discard the stale evidence and treat the segment
    /// as empty.
    fn force_clear(&mut self, out: &mut Vec<SegmentNotification>) {
        let discrepancies = self.vars.upstream.reconcile() + self.vars.downstream.reconcile();
        self.clearance.reset();
        self.vars.adjust_health(health::FORCED_CLEAR);
        warn!(
            segment_id = self.segment_id,
            discrepancies, "Conservative clearance forced"
        );
        self.record_logic_errors(discrepancies, out);
    }

    fn grant_green(&mut self, now: Instant, out: &mut Vec<SegmentNotification>) -> SegmentResult<()> {
        let mut demand = [false; 2];
        for (slot, side) in demand.iter_mut().zip(Side::BOTH) {
            *slot = self.waiting(side)? > 0;
        }
        let side = choose_green_side(self.vars.last_green, |s| demand[s as usize]);

        // Waiting vehicles of the granted side enter the segment
        let overflow = std::mem::take(self.vars.overflow_mut(side));
        for plate in self.zones.drain(self.zone_id, side)?.into_iter().chain(overflow) {
            self.vars.flow_mut(side).admit(plate);
        }

        self.vars.last_green = side;
        self.vars.late_admission = None;
        self.vars.pending_force_switch = false;
        self.vars.max_red_fault_raised = false;
        self.clearance.reset();
        self.transition(SegmentState::green_for(side), now, out);
        Ok(())
    }

    /// Vehicles requesting right-of-way on `side`.
    fn waiting(&self, side: Side) -> SegmentResult<usize> {
        Ok(self.zones.count(self.zone_id, side)? + self.vars.overflow(side).len())
    }

    fn transition(&mut self, to: SegmentState, now: Instant, out: &mut Vec<SegmentNotification>) {
        let from = self.vars.current_state;
        if from == to {
            return;
        }
        self.vars.current_state = to;
        self.vars.phase_start = now;

        if let Some(side) = from.green_side() {
            self.vars.last_green = side;
            if to == SegmentState::AllRedClear {
                self.vars.late_admission = Some(side);
            }
        }

        if to == SegmentState::AllRedClear {
            self.vars.max_red_fault_raised = false;
            self.vars.last_decision = None;
            self.vars.last_force_clear = false;
        } else {
            self.clearance.reset();
        }

        info!(segment_id = self.segment_id, %from, %to, "Segment transition");
        out.push(SegmentNotification::StateChanged {
            segment_id: self.segment_id,
            from,
            to,
        });
    }

    fn raise_fault(&mut self, reason: SegmentFaultReason, out: &mut Vec<SegmentNotification>) {
        error!(segment_id = self.segment_id, %reason, "Segment fault");
        out.push(SegmentNotification::Fault {
            segment_id: self.segment_id,
            reason,
        });
    }
}
