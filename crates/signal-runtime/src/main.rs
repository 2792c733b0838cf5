//! # LaneGuard Signal Controller
//!
//! Entry point: telemetry, configuration, runtime, then wait for Ctrl+C.

use anyhow::Result;
use tracing::info;

use signal_runtime::container::load_config;
use signal_runtime::SignalRuntime;
use signal_telemetry::{init_telemetry, TelemetryConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry = init_telemetry(TelemetryConfig::from_env())?;

    let config = load_config()?;

    let mut runtime = SignalRuntime::new(config)?;
    runtime.start().await?;

    info!("Controller is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    if let Some(scheduler) = runtime.scheduler() {
        info!("Final status:\n{}", scheduler.status_summary());
    }
    runtime.shutdown().await;

    Ok(())
}
