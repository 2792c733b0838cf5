//! Prometheus metrics for LaneGuard.
//!
//! All metrics follow the naming convention: `lg_<component>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge,
    Opts, Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // DETECTOR PROTOCOL
    // =========================================================================

    pub static ref FRAMES_DECODED: IntCounter = IntCounter::new(
        "lg_detector_frames_decoded_total",
        "Frames decoded from detector streams"
    ).expect("metric creation failed");

    pub static ref FRAME_ERRORS: IntCounterVec = IntCounterVec::new(
        Opts::new("lg_detector_frame_errors_total", "Frames dropped by the decoder"),
        &["kind"]  // kind: checksum/length_mismatch/too_long/...
    ).expect("metric creation failed");

    pub static ref HEARTBEATS_ECHOED: IntCounter = IntCounter::new(
        "lg_detector_heartbeats_echoed_total",
        "Heartbeat frames echoed back to detectors"
    ).expect("metric creation failed");

    pub static ref DETECTOR_CONNECTIONS: IntGauge = IntGauge::new(
        "lg_detector_connections",
        "Currently connected detectors"
    ).expect("metric creation failed");

    // =========================================================================
    // CLASSIFIER
    // =========================================================================

    pub static ref VEHICLE_EVENTS: IntCounterVec = IntCounterVec::new(
        Opts::new("lg_classifier_vehicle_events_total", "Vehicle events routed to segments"),
        &["event"]
    ).expect("metric creation failed");

    pub static ref CLASSIFY_DROPS: IntCounterVec = IntCounterVec::new(
        Opts::new("lg_classifier_drops_total", "Detections dropped during classification"),
        &["reason"]
    ).expect("metric creation failed");

    // =========================================================================
    // SEGMENT CONTROL
    // =========================================================================

    pub static ref SEGMENT_TRANSITIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("lg_segment_transitions_total", "Segment state transitions"),
        &["segment", "to"]
    ).expect("metric creation failed");

    pub static ref CLEARANCE_VERDICTS: IntCounterVec = IntCounterVec::new(
        Opts::new("lg_segment_clearance_verdicts_total", "Clearance verdict changes"),
        &["decision"]  // decision: safe/warning/conservative/wait
    ).expect("metric creation failed");

    pub static ref FORCED_CLEARS: IntCounter = IntCounter::new(
        "lg_segment_forced_clears_total",
        "Conservative clears forced by timeout"
    ).expect("metric creation failed");

    pub static ref SEGMENT_FAULTS: IntCounterVec = IntCounterVec::new(
        Opts::new("lg_segment_faults_total", "Faults escalated by segments"),
        &["segment"]
    ).expect("metric creation failed");

    pub static ref SEGMENT_EVENT_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "lg_segment_event_duration_seconds",
            "Time spent handling one segment event"
        ).buckets(exponential_buckets(0.00001, 2.0, 14).expect("valid buckets"))
    ).expect("metric creation failed");

    // =========================================================================
    // SYSTEM CONTROL
    // =========================================================================

    pub static ref SYSTEM_HEALTH: IntGauge = IntGauge::new(
        "lg_system_health_score",
        "System health score (0-100)"
    ).expect("metric creation failed");

    pub static ref SYSTEM_TRANSITIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("lg_system_transitions_total", "System state transitions"),
        &["to"]
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Calling it again is harmless.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Detector
        Box::new(FRAMES_DECODED.clone()),
        Box::new(FRAME_ERRORS.clone()),
        Box::new(HEARTBEATS_ECHOED.clone()),
        Box::new(DETECTOR_CONNECTIONS.clone()),
        // Classifier
        Box::new(VEHICLE_EVENTS.clone()),
        Box::new(CLASSIFY_DROPS.clone()),
        // Segments
        Box::new(SEGMENT_TRANSITIONS.clone()),
        Box::new(CLEARANCE_VERDICTS.clone()),
        Box::new(FORCED_CLEARS.clone()),
        Box::new(SEGMENT_FAULTS.clone()),
        Box::new(SEGMENT_EVENT_DURATION.clone()),
        // System
        Box::new(SYSTEM_HEALTH.clone()),
        Box::new(SYSTEM_TRANSITIONS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_twice() {
        register_metrics().unwrap();
        register_metrics().unwrap();
    }

    #[test]
    fn test_encode_contains_registered_metrics() {
        register_metrics().unwrap();
        SYSTEM_HEALTH.set(80);
        FRAME_ERRORS.with_label_values(&["checksum"]).inc();

        let text = encode_metrics().unwrap();
        assert!(text.contains("lg_system_health_score 80"));
        assert!(text.contains("lg_detector_frame_errors_total{kind=\"checksum\"}"));
    }

    #[test]
    fn test_histogram_timer() {
        let before = SEGMENT_EVENT_DURATION.get_sample_count();
        {
            let _timer = time_histogram!(SEGMENT_EVENT_DURATION);
        }
        assert_eq!(SEGMENT_EVENT_DURATION.get_sample_count(), before + 1);
    }
}
