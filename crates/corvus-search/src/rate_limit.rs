//! Enforces Brave's minimum spacing between requests.
//!
//! Grounded on `original_source/app/core/search.py`'s `RateLimiter`: an
//! `asyncio.Lock` guarding a last-call timestamp, sleeping out the
//! remaining interval before releasing the lock to the next caller.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self { min_interval, last_call: Mutex::new(None) }
    }

    /// Blocks until at least `min_interval` has elapsed since the previous
    /// call returned, serializing callers through the same lock the
    /// source uses so sleeps never overlap.
    pub async fn acquire(&self) {
        let mut last_call = self.last_call.lock().await;
        let now = Instant::now();
        if let Some(previous) = *last_call {
            let elapsed = now.duration_since(previous);
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last_call = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_acquire_waits_out_the_interval() {
        let limiter = RateLimiter::new(Duration::from_millis(50));
        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
