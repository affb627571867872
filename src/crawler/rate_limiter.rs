//! Minimum spacing between fetches
//!
//! Only one host is ever crawled and only one fetch is in flight, so a single
//! timestamp is all the state needed.

use std::time::Duration;
use tokio::time::Instant;

/// Enforces a fixed minimum delay between the starts of consecutive fetches
#[derive(Debug)]
pub struct RateLimiter {
    delay: Duration,
    last_fetch_start: Option<Instant>,
}

impl RateLimiter {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_fetch_start: None,
        }
    }

    /// Waits until at least `delay` has passed since the previous call returned,
    /// then records the current instant as the start of the next fetch
    ///
    /// The first call returns immediately.
    pub async fn wait(&mut self) {
        if let Some(wait) = self.time_until_ready(Instant::now()) {
            tracing::trace!("Rate limiting for {:?}", wait);
            tokio::time::sleep(wait).await;
        }
        self.last_fetch_start = Some(Instant::now());
    }

    /// Time left before the next fetch may start, or None if it may start now
    pub fn time_until_ready(&self, now: Instant) -> Option<Duration> {
        let last = self.last_fetch_start?;
        let ready_at = last + self.delay;
        if now >= ready_at {
            None
        } else {
            Some(ready_at - now)
        }
    }

    /// The configured delay
    pub fn delay(&self) -> Duration {
        self.delay
    }
}
