//! Periodic timer tick

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

use crate::scheduler::EventScheduler;

/// Tick every machine at `period` until shutdown. Late ticks are skipped,
/// never bunched.
pub async fn run_timer(
    scheduler: EventScheduler,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // First tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => scheduler.tick(),
            _ = shutdown.changed() => {
                info!("[lg-05] Timer stopped");
                break;
            }
        }
    }
}
