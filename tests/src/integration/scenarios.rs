//! # Acceptance Scenarios
//!
//! | Scenario | Flow |
//! |----------|------|
//! | A | Malformed frame is dropped, connection stays open |
//! | B | Heartbeat decoded and echoed byte for byte |
//! | C | Clearance verdicts from ID sets and counters |
//! | D | Max-red fault degrades the system within one cycle |
//! | E | Degraded system recovers on `ConditionsRestored` |
//! | F | Full meeting area still hands over right-of-way |
//! | G | Timer ticks alone escalate a stuck all-red to DegradedMode |

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    use async_trait::async_trait;
    use chrono::Utc;
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};
    use tokio::sync::watch;

    use lg_01_detector_protocol::{
        encode_vehicle_record, ConnectionConfig, DetectorConnection, DetectorFrame, FrameDecoder,
        FrameEncoder, FrameSink, ProtocolError, VehicleDetection,
    };
    use lg_03_meeting_zones::{MeetingZoneApi, MeetingZoneRegistry};
    use lg_04_clearance::{decide, DirectionView};
    use lg_05_segment_control::{SegmentFaultReason, SegmentStateMachine};
    use lg_06_system_control::{SegmentCommand, SystemConfig, SystemEvent, SystemStateMachine};
    use shared_bus::{EventFilter, EventTopic, SignalEvent};
    use shared_types::{
        ClearanceDecision, EventPayload, PlateId, SegmentEvent, SegmentState, Side, SystemState,
    };
    use signal_runtime::container::{SignalConfig, SignalContainer};
    use signal_runtime::EventScheduler;

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    const HEARTBEAT_FRAME: [u8; 10] = [0x7E, 0x00, 0x06, 0x00, 0x0A, 0x00, 0x00, 0x01, 0x0B, 0x7D];

    #[derive(Default)]
    struct Recorder {
        detections: Mutex<Vec<VehicleDetection>>,
        heartbeats: Mutex<Vec<Ipv4Addr>>,
        errors: Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl FrameSink for Recorder {
        async fn on_detection(&self, detection: VehicleDetection) {
            self.detections.lock().unwrap().push(detection);
        }

        fn on_heartbeat(&self, signal_ip: Ipv4Addr) {
            self.heartbeats.lock().unwrap().push(signal_ip);
        }

        fn on_frame_error(&self, error: &ProtocolError) {
            self.errors.lock().unwrap().push(error.kind());
        }
    }

    fn connection_config() -> ConnectionConfig {
        ConnectionConfig {
            read_timeout: Duration::from_secs(5),
            read_buffer_size: 64,
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // =========================================================================
    // SCENARIO A: malformed frame
    // =========================================================================

    #[test]
    fn test_scenario_a_length_mismatch_is_dropped() {
        let mut decoder = FrameDecoder::new();
        let results = decoder.feed_slice(&[0x7E, 0x00, 0x04, 0x01, 0xFF, 0x7D]);

        assert_eq!(results.len(), 1);
        assert!(matches!(
            results[0],
            Err(ProtocolError::LengthMismatch { declared: 4, .. })
        ));
        assert!(!decoder.is_mid_frame());

        // The decoder keeps working
        let results = decoder.feed_slice(&HEARTBEAT_FRAME);
        assert_eq!(results.len(), 1);
        assert!(results[0].is_ok());
    }

    #[tokio::test]
    async fn test_scenario_a_connection_survives_bad_frame() {
        let (mut detector, server) = duplex(256);
        let sink = Arc::new(Recorder::default());

        let task_sink = Arc::clone(&sink);
        let connection = tokio::spawn(async move {
            DetectorConnection::new(server, "scenario-a", connection_config())
                .run(task_sink.as_ref())
                .await
        });

        detector
            .write_all(&[0x7E, 0x00, 0x04, 0x01, 0xFF, 0x7D])
            .await
            .unwrap();
        let record = encode_vehicle_record(3, "B7", 2, 1, 25);
        detector
            .write_all(&FrameEncoder::new().encode(&record).unwrap())
            .await
            .unwrap();
        drop(detector);

        let stats = connection.await.unwrap().unwrap();
        assert_eq!(stats.frame_errors, 1);
        assert_eq!(stats.detections_forwarded, 1);
        assert_eq!(sink.errors.lock().unwrap().as_slice(), &["length_mismatch"]);
        assert_eq!(sink.detections.lock().unwrap()[0].plate, "B7");
    }

    // =========================================================================
    // SCENARIO B: heartbeat echo
    // =========================================================================

    #[test]
    fn test_scenario_b_heartbeat_decodes() {
        let mut decoder = FrameDecoder::new();
        let data = decoder.feed_slice(&HEARTBEAT_FRAME).remove(0).unwrap();
        assert_eq!(data, vec![0x00, 10, 0, 0, 1]);

        let frame = DetectorFrame::parse(&data, Utc::now()).unwrap();
        assert_eq!(
            frame,
            DetectorFrame::Heartbeat {
                signal_ip: Ipv4Addr::new(10, 0, 0, 1)
            }
        );
        assert_eq!(FrameEncoder::new().encode(&data).unwrap(), HEARTBEAT_FRAME);
    }

    #[tokio::test]
    async fn test_scenario_b_heartbeat_echoed_over_connection() {
        let (mut detector, server) = duplex(256);
        let sink = Arc::new(Recorder::default());

        let task_sink = Arc::clone(&sink);
        let connection = tokio::spawn(async move {
            DetectorConnection::new(server, "scenario-b", connection_config())
                .run(task_sink.as_ref())
                .await
        });

        // Split across writes to exercise the streaming decoder
        detector.write_all(&HEARTBEAT_FRAME[..4]).await.unwrap();
        detector.write_all(&HEARTBEAT_FRAME[4..]).await.unwrap();

        let mut echo = [0u8; HEARTBEAT_FRAME.len()];
        detector.read_exact(&mut echo).await.unwrap();
        assert_eq!(echo, HEARTBEAT_FRAME);

        drop(detector);
        let stats = connection.await.unwrap().unwrap();
        assert_eq!(stats.heartbeats_echoed, 1);
        assert_eq!(
            sink.heartbeats.lock().unwrap().as_slice(),
            &[Ipv4Addr::new(10, 0, 0, 1)]
        );
    }

    // =========================================================================
    // SCENARIO C: clearance verdicts
    // =========================================================================

    #[test]
    fn test_scenario_c_clearance_verdicts() {
        // {"A1"}, in=3, out=2
        assert_eq!(decide(&DirectionView::new(1, 3, 2)), ClearanceDecision::Wait);
        // {}, in=5, out=5
        assert_eq!(decide(&DirectionView::new(0, 5, 5)), ClearanceDecision::Safe);
    }

    // =========================================================================
    // SCENARIO D: max-red fault through the scheduler
    // =========================================================================

    struct Controller {
        scheduler: EventScheduler,
        zones: Arc<MeetingZoneRegistry>,
        shutdown: watch::Sender<bool>,
        tasks: Vec<tokio::task::JoinHandle<()>>,
    }

    impl Controller {
        fn start() -> Self {
            Self::start_with(SignalConfig::default())
        }

        fn start_with(config: SignalConfig) -> Self {
            let container = SignalContainer::new(config).unwrap();
            let now = tokio::time::Instant::now().into_std();
            let segments: Vec<SegmentStateMachine> = container.build_segments(now);
            assert!(segments
                .iter()
                .all(|segment| segment.state() == SegmentState::AllRedClear));

            let (shutdown, shutdown_rx) = watch::channel(false);
            let (scheduler, tasks) = EventScheduler::start(
                segments,
                container.build_system(now).unwrap(),
                container.event_bus.clone(),
                container.config.scheduler.queue_capacity,
                shutdown_rx,
            );
            Self {
                scheduler,
                zones: Arc::clone(&container.zones),
                shutdown,
                tasks,
            }
        }

        async fn tick_after(&self, secs: u64) {
            tokio::time::advance(Duration::from_secs(secs)).await;
            self.scheduler.tick();
            settle().await;
        }

        /// Drive the system to InductiveMode with default timings.
        async fn run_to_inductive(&self) {
            for event in [SystemEvent::ConfigurationLoaded, SystemEvent::SelfCheckPassed] {
                self.scheduler.process_system_event(event).await.unwrap();
            }
            for secs in [0, 5, 10] {
                tokio::time::advance(Duration::from_secs(secs)).await;
                self.scheduler.tick();
                settle().await;
            }
            assert_eq!(
                self.scheduler.system_view().snapshot.state,
                SystemState::InductiveMode
            );
        }

        async fn segment_event(&self, event: SegmentEvent, payload: EventPayload) {
            self.scheduler
                .process_segment_event(1, event, payload)
                .await
                .unwrap();
            settle().await;
        }

        async fn stop(self) {
            self.shutdown.send(true).unwrap();
            for task in self.tasks {
                task.await.unwrap();
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_scenario_d_max_red_fault_degrades_system() {
        let controller = Controller::start();
        controller.run_to_inductive().await;
        assert_eq!(
            controller.scheduler.segment_snapshot(1).unwrap().state,
            SegmentState::UpstreamGreen
        );

        // A vehicle enters and never leaves
        controller
            .segment_event(
                SegmentEvent::VehicleEnterUpstream,
                EventPayload::vehicle(1, PlateId::new("A1")),
            )
            .await;

        // Past min green with a switch request, then max green
        tokio::time::advance(Duration::from_secs(10)).await;
        controller
            .segment_event(SegmentEvent::ForceSwitch, EventPayload::for_segment(1))
            .await;
        controller
            .segment_event(SegmentEvent::GreenTimeout, EventPayload::for_segment(1))
            .await;
        assert_eq!(
            controller.scheduler.segment_snapshot(1).unwrap().state,
            SegmentState::AllRedClear
        );

        controller
            .segment_event(SegmentEvent::ClearTimeout, EventPayload::for_segment(1))
            .await;

        let view = controller.scheduler.system_view();
        assert_eq!(view.snapshot.state, SystemState::DegradedMode);
        assert!(view
            .snapshot
            .last_fault_source
            .unwrap()
            .starts_with("segment 1"));
        assert_eq!(
            controller.scheduler.segment_snapshot(1).unwrap().state,
            SegmentState::YellowFlashManual
        );

        controller.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_scenario_d_fault_is_published() {
        let container = SignalContainer::new(SignalConfig::default()).unwrap();
        let mut faults = container
            .event_bus
            .subscribe(EventFilter::topics(vec![EventTopic::Fault]));

        let now = tokio::time::Instant::now().into_std();
        let (shutdown, shutdown_rx) = watch::channel(false);
        let (scheduler, _tasks) = EventScheduler::start(
            container.build_segments(now),
            container.build_system(now).unwrap(),
            container.event_bus.clone(),
            16,
            shutdown_rx,
        );

        // Held segments never fault; release the hold first
        scheduler
            .process_segment_event(1, SegmentEvent::ResumeInductive, EventPayload::for_segment(1))
            .await
            .unwrap();
        scheduler
            .process_segment_event(
                1,
                SegmentEvent::VehicleEnterUpstream,
                EventPayload::vehicle(1, PlateId::new("A1")),
            )
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(10)).await;
        for event in [SegmentEvent::ForceSwitch, SegmentEvent::GreenTimeout] {
            scheduler
                .process_segment_event(1, event, EventPayload::for_segment(1))
                .await
                .unwrap();
        }
        scheduler
            .process_segment_event(1, SegmentEvent::ClearTimeout, EventPayload::for_segment(1))
            .await
            .unwrap();

        let event = faults.recv().await.unwrap();
        assert!(matches!(event, SignalEvent::SegmentFault { segment_id: 1, .. }));

        shutdown.send(true).unwrap();
    }

    // =========================================================================
    // SCENARIO F: meeting-area overflow
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_scenario_f_overflow_vehicle_gets_green() {
        let mut config = SignalConfig::default();
        config.topology.zone_capacity = 1;
        let controller = Controller::start_with(config);
        controller.run_to_inductive().await;

        for plate in ["D1", "D2"] {
            controller
                .segment_event(
                    SegmentEvent::VehicleEnterDownstream,
                    EventPayload::vehicle(1, PlateId::new(plate)),
                )
                .await;
        }
        assert_eq!(controller.zones.count(1, Side::Downstream), Ok(1));
        let snapshot = controller.scheduler.segment_snapshot(1).unwrap();
        assert_eq!(snapshot.downstream.waiting, 2);
        assert!(snapshot.downstream.vehicles.is_empty());

        // Min green ends upstream, the next tick grants downstream
        controller.tick_after(10).await;
        controller.tick_after(1).await;

        let snapshot = controller.scheduler.segment_snapshot(1).unwrap();
        assert_eq!(snapshot.state, SegmentState::DownstreamGreen);
        assert_eq!(
            snapshot.downstream.vehicles,
            vec![PlateId::new("D1"), PlateId::new("D2")]
        );
        assert_eq!(snapshot.downstream.waiting, 0);
        assert_eq!(
            controller.scheduler.system_view().snapshot.state,
            SystemState::InductiveMode
        );

        controller.stop().await;
    }

    // =========================================================================
    // SCENARIO G: tick-driven max-red fault
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_scenario_g_ticks_escalate_max_red() {
        let controller = Controller::start();
        controller.run_to_inductive().await;

        // A1 never leaves; D1 waits for right-of-way
        controller
            .segment_event(
                SegmentEvent::VehicleEnterUpstream,
                EventPayload::vehicle(1, PlateId::new("A1")),
            )
            .await;
        controller
            .segment_event(
                SegmentEvent::VehicleEnterDownstream,
                EventPayload::vehicle(1, PlateId::new("D1")),
            )
            .await;

        // Max green ends the phase with A1 inside
        controller.tick_after(60).await;
        let snapshot = controller.scheduler.segment_snapshot(1).unwrap();
        assert_eq!(snapshot.state, SegmentState::AllRedClear);

        controller.tick_after(1).await;
        assert_eq!(
            controller.scheduler.segment_snapshot(1).unwrap().last_decision,
            Some(ClearanceDecision::Wait)
        );
        assert_eq!(
            controller.scheduler.system_view().snapshot.state,
            SystemState::InductiveMode
        );

        // Max red reached 120s after all-red began
        controller.tick_after(119).await;

        let expected = SegmentFaultReason::MaxRedExceeded {
            waited: Duration::from_secs(120),
        };
        let view = controller.scheduler.system_view();
        assert_eq!(view.snapshot.state, SystemState::DegradedMode);
        assert_eq!(
            view.snapshot.last_fault_source,
            Some(format!("segment 1: {expected}"))
        );
        assert_eq!(
            controller.scheduler.segment_snapshot(1).unwrap().state,
            SegmentState::YellowFlashManual
        );

        controller.stop().await;
    }

    // =========================================================================
    // SCENARIO E: recovery from DegradedMode
    // =========================================================================

    #[test]
    fn test_scenario_e_conditions_restored() {
        let t0 = Instant::now();
        let at = |secs: u64| t0 + Duration::from_secs(secs);
        let config = SystemConfig::default();
        let stable = config.stable_operation_time;
        let mut system = SystemStateMachine::new(config, vec![1], t0).unwrap();

        system.handle(SystemEvent::ConfigurationLoaded, at(0)).unwrap();
        system.handle(SystemEvent::SelfCheckPassed, at(0)).unwrap();
        system.handle(SystemEvent::TimerTick, at(5)).unwrap();
        system
            .handle(
                SystemEvent::SegmentClearance {
                    segment: 1,
                    cleared: true,
                },
                at(15),
            )
            .unwrap();
        assert_eq!(system.state(), SystemState::InductiveMode);

        let transition = system
            .handle(
                SystemEvent::SegmentFault {
                    segment: 1,
                    reason: "all-red held 120s without clearance".into(),
                },
                at(20),
            )
            .unwrap()
            .unwrap();
        assert_eq!(transition.to, SystemState::DegradedMode);
        assert_eq!(transition.command, SegmentCommand::ManualYellowFlash);

        system.override_health(80);

        // Too early: the fault is younger than the stable operation time
        let early = at(20) + stable - Duration::from_secs(1);
        assert_eq!(
            system.handle(SystemEvent::ConditionsRestored, early).unwrap(),
            None
        );

        let transition = system
            .handle(SystemEvent::ConditionsRestored, at(20) + stable)
            .unwrap()
            .unwrap();
        assert_eq!(transition.to, SystemState::AllRedTransition);
        assert_eq!(transition.command, SegmentCommand::HoldAllRed);
    }
}
