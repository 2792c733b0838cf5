//! Conservative-clear timer
//!
//! Bounds how long a segment may sit on inconsistent evidence. Time is
//! passed in by the caller so the timer stays deterministic under test.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct ConservativeClearTimer {
    started_at: Option<Instant>,
    duration: Duration,
}

impl ConservativeClearTimer {
    pub fn new(duration: Duration) -> Self {
        Self {
            started_at: None,
            duration,
        }
    }

    /// Start the timer. Starting a running timer keeps the original start.
    ///
    /// Returns whether the timer was newly started.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.started_at.is_some() {
            return false;
        }
        self.started_at = Some(now);
        true
    }

    /// Stop the timer. Returns whether it was running.
    pub fn stop(&mut self) -> bool {
        self.started_at.take().is_some()
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    pub fn elapsed(&self, now: Instant) -> Option<Duration> {
        self.started_at
            .map(|start| now.saturating_duration_since(start))
    }

    /// Whether the configured duration has passed since start.
    pub fn should_force(&self, now: Instant) -> bool {
        self.elapsed(now)
            .is_some_and(|elapsed| elapsed >= self.duration)
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DURATION: Duration = Duration::from_secs(10);

    #[test]
    fn test_start_is_idempotent() {
        let t0 = Instant::now();
        let mut timer = ConservativeClearTimer::new(DURATION);

        assert!(timer.start(t0));
        assert!(!timer.start(t0 + Duration::from_secs(5)));
        assert_eq!(timer.started_at(), Some(t0));
    }

    #[test]
    fn test_should_force_after_duration() {
        let t0 = Instant::now();
        let mut timer = ConservativeClearTimer::new(DURATION);
        assert!(!timer.should_force(t0 + DURATION));

        timer.start(t0);
        assert!(!timer.should_force(t0 + Duration::from_secs(9)));
        assert!(timer.should_force(t0 + DURATION));
    }

    #[test]
    fn test_stop_prevents_stale_force() {
        let t0 = Instant::now();
        let mut timer = ConservativeClearTimer::new(DURATION);
        timer.start(t0);
        assert!(timer.stop());
        assert!(!timer.stop());
        assert!(!timer.should_force(t0 + DURATION * 2));

        // Restart measures from the new start
        timer.start(t0 + DURATION * 2);
        assert!(!timer.should_force(t0 + DURATION * 2 + Duration::from_secs(1)));
    }
}
