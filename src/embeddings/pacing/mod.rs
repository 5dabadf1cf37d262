//! Fixed-interval pacing for batched embedding calls.


use std::time::{Duration, Instant};

use tracing::debug;

/// Gate that enforces a minimum interval between releases.
///
/// The first release is never delayed; each subsequent release waits out
/// whatever remains of the interval since the previous one. Keeping the delay
/// computation separate from the sleep makes the pacing policy testable
/// without wall-clock waits.
#[derive(Debug)]
pub struct RateGate {
    interval: Duration,
    last_release: Option<Instant>,
}

impl RateGate {
    #[inline]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_release: None,
        }
    }

    /// Remaining delay if a release were attempted at `now`.
    #[inline]
    pub fn delay_before_next(&self, now: Instant) -> Duration {
        match self.last_release {
            None => Duration::ZERO,
            Some(last) => self
                .interval
                .checked_sub(now.duration_since(last))
                .unwrap_or(Duration::ZERO),
        }
    }

    /// Block until the interval since the last release has elapsed, then
    /// record this release.
    #[inline]
    pub fn wait(&mut self) {
        let delay = self.delay_before_next(Instant::now());
        if !delay.is_zero() {
            debug!("Pacing: waiting {:?} before next batch", delay);
            std::thread::sleep(delay);
        }
        self.last_release = Some(Instant::now());
    }
}
