//! Fixed-period render ticker.
//!
//! Painting is decoupled from frame arrival: however fast pixel updates come
//! in, the collaborator is asked to repaint at most once per period.  Missed
//! ticks (a slow paint, a busy task) are skipped, never replayed in a burst.

use std::future;
use std::time::Duration;

use tokio::time::{interval, Instant, Interval, MissedTickBehavior};

/// A ticker that can be started and stopped.
#[derive(Debug)]
pub struct RenderClock {
    period: Duration,
    interval: Option<Interval>,
}

impl RenderClock {
    /// Creates a stopped clock.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            interval: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    /// Starts ticking.  The first tick is immediate.  No-op when running.
    pub fn start(&mut self) {
        if self.interval.is_none() {
            let mut ticker = interval(self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            self.interval = Some(ticker);
        }
    }

    /// Stops ticking and releases the timer.
    pub fn stop(&mut self) {
        self.interval = None;
    }

    /// Waits for the next tick.  Never completes while stopped.
    pub async fn tick(&mut self) -> Instant {
        match self.interval.as_mut() {
            Some(ticker) => ticker.tick().await,
            None => future::pending().await,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_pending, assert_ready, task};

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_is_immediate() {
        let mut clock = RenderClock::new(Duration::from_millis(100));
        clock.start();

        let start = Instant::now();
        clock.tick().await;

        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_follow_fixed_period() {
        let mut clock = RenderClock::new(Duration::from_millis(100));
        clock.start();
        let start = clock.tick().await;

        let second = clock.tick().await;
        let third = clock.tick().await;

        assert_eq!(second - start, Duration::from_millis(100));
        assert_eq!(third - start, Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missed_ticks_are_skipped() {
        let mut clock = RenderClock::new(Duration::from_millis(100));
        clock.start();
        let start = clock.tick().await;

        // Stall for three and a half periods.
        tokio::time::sleep(Duration::from_millis(350)).await;
        clock.tick().await; // the one overdue tick fires at once
        let next = clock.tick().await;

        // Skip realigns to the period grid instead of bursting.
        assert_eq!(next - start, Duration::from_millis(400));
    }

    #[test]
    fn test_stopped_clock_never_ticks() {
        let mut clock = RenderClock::new(Duration::from_millis(100));
        let mut tick = task::spawn(clock.tick());

        assert_pending!(tick.poll());
    }

    #[tokio::test]
    async fn test_stop_releases_timer() {
        let mut clock = RenderClock::new(Duration::from_millis(10));
        clock.start();
        assert!(clock.is_running());

        clock.stop();

        assert!(!clock.is_running());
        let mut tick = task::spawn(clock.tick());
        assert_pending!(tick.poll());
    }

    #[tokio::test]
    async fn test_started_clock_is_ready_immediately() {
        let mut clock = RenderClock::new(Duration::from_millis(100));
        clock.start();

        let mut tick = task::spawn(clock.tick());

        assert_ready!(tick.poll());
    }
}
