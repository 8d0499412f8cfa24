use std::time::Duration;

use log::debug;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Minimum spacing between outbound calls to one endpoint family.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

/// Enforces a minimum delay between remote calls. One instance is shared
/// by every client talking to the same endpoint family; holding the lock
/// across the sleep keeps the spacing guarantee if callers ever overlap.
pub struct RateLimiter {
    delay: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(delay: Duration) -> Self {
        RateLimiter {
            delay,
            last_call: Mutex::new(None),
        }
    }

    /// Blocks until `delay` has elapsed since the previous `throttle` on
    /// this limiter, then records the new timestamp.
    pub async fn throttle(&self) {
        let mut last_call = self.last_call.lock().await;
        if let Some(last) = *last_call {
            let elapsed = last.elapsed();
            if elapsed < self.delay {
                let wait = self.delay - elapsed;
                debug!("Rate limiting wait: {} ms", wait.as_millis());
                tokio::time::sleep(wait).await;
            }
        }
        *last_call = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn throttle_spacing_test() {
        let limiter = RateLimiter::new(Duration::from_millis(500));
        let start = Instant::now();

        limiter.throttle().await;
        assert_eq!(start.elapsed(), Duration::ZERO, "First call should not wait");

        limiter.throttle().await;
        assert!(start.elapsed() >= Duration::from_millis(500));

        limiter.throttle().await;
        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn throttle_skips_wait_after_idle_test() {
        let limiter = RateLimiter::new(Duration::from_millis(500));
        limiter.throttle().await;

        tokio::time::sleep(Duration::from_secs(2)).await;
        let before = Instant::now();
        limiter.throttle().await;
        assert_eq!(before.elapsed(), Duration::ZERO, "Spacing already satisfied");
    }
}
