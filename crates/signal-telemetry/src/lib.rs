//! # Signal Telemetry
//!
//! Structured logging and Prometheus metrics for LaneGuard.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use signal_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LG_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `LG_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |
//! | `LG_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `LG_SERVICE_NAME` | `laneguard` | Service name |
//!
//! Metrics are gathered in [`metrics::REGISTRY`]; [`encode_metrics`]
//! renders them for whatever serves the scrape endpoint.

pub mod metrics;

mod config;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, CLASSIFY_DROPS, CLEARANCE_VERDICTS,
    DETECTOR_CONNECTIONS, FORCED_CLEARS, FRAMES_DECODED, FRAME_ERRORS, HEARTBEATS_ECHOED,
    SEGMENT_EVENT_DURATION, SEGMENT_FAULTS, SEGMENT_TRANSITIONS, SYSTEM_HEALTH,
    SYSTEM_TRANSITIONS, VEHICLE_EVENTS,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracerInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and register metrics.
///
/// Hold the returned guard for the lifetime of the process.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    register_metrics()?;
    tracing_setup::init_tracing(&config)?;
    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}

/// Logs shutdown when dropped.
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}
