/*!
 * Interval rate limiter for oracle dispatch.
 *
 * Each `acquire` reserves the next free slot and waits for it, so permits are
 * handed out at least `min_interval` apart no matter how many callers contend.
 */

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Hands out permits spaced by a minimum interval
#[derive(Debug, Clone)]
pub struct RateLimiter {
    /// Minimum spacing between two permits
    min_interval: Duration,
    /// Earliest instant the next permit may be handed out
    next_slot: Arc<Mutex<Option<Instant>>>,
}

impl RateLimiter {
    /// Create a limiter with a fixed minimum interval
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Create a limiter that never waits
    pub fn unlimited() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Create a limiter from a requests-per-minute budget.
    ///
    /// `None` or zero disables limiting.
    pub fn per_minute(requests_per_minute: Option<u32>) -> Self {
        match requests_per_minute {
            Some(rpm) if rpm > 0 => Self::new(Duration::from_millis(60_000 / rpm as u64)),
            _ => Self::unlimited(),
        }
    }

    /// Minimum spacing between permits
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait for the next permit.
    pub async fn acquire(&self) {
        if self.min_interval.is_zero() {
            return;
        }

        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next {
                Some(reserved) if reserved > now => reserved,
                _ => now,
            };
            *next = Some(slot + self.min_interval);
            slot
        };

        tokio::time::sleep_until(slot).await;
    }
}
