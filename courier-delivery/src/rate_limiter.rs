//! Process-wide send rate limiting using a token bucket
//!
//! The bucket holds `limit` tokens refilled continuously over
//! `interval`; each transmission consumes one. A send that finds the
//! bucket empty waits for a token instead of failing, so the rate
//! budget shapes throughput without surfacing errors.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

#[derive(Debug)]
struct TokenBucket {
    /// Current number of tokens
    tokens: f64,
    /// Maximum tokens (one interval's budget)
    capacity: f64,
    /// Tokens added per second
    refill_rate: f64,
    /// Last time tokens were added
    last_refill: Instant,
}

impl TokenBucket {
    fn new(limit: u32, interval: Duration) -> Self {
        let capacity = f64::from(limit.max(1));
        let interval_secs = interval.as_secs_f64().max(f64::MIN_POSITIVE);
        Self {
            tokens: capacity, // Start with a full bucket
            capacity,
            refill_rate: capacity / interval_secs,
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        self.last_refill = now;
    }

    fn try_consume(&mut self) -> bool {
        self.refill();

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn time_until_available(&mut self) -> Duration {
        self.refill();

        if self.tokens >= 1.0 {
            return Duration::ZERO;
        }

        let needed = 1.0 - self.tokens;
        Duration::from_secs_f64(needed / self.refill_rate)
    }
}

/// Shared rate limiter for the whole process.
///
/// All delivery engine invocations, across every orchestrator dispatch
/// and any other caller, contend for the same budget.
#[derive(Debug)]
pub struct RateLimiter {
    bucket: Mutex<TokenBucket>,
}

impl RateLimiter {
    /// `limit` sends per `interval_ms` milliseconds.
    #[must_use]
    pub fn new(limit: u32, interval_ms: u64) -> Self {
        Self {
            bucket: Mutex::new(TokenBucket::new(limit, Duration::from_millis(interval_ms))),
        }
    }

    /// Consume one send token, waiting until one is available.
    ///
    /// Never fails; a caller beyond the budget is delayed, not refused.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut bucket = self.bucket.lock();
                if bucket.try_consume() {
                    return;
                }
                bucket.time_until_available()
            };

            tokio::time::sleep(wait).await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn bucket_starts_full_and_drains() {
        let mut bucket = TokenBucket::new(5, Duration::from_secs(1));

        for _ in 0..5 {
            assert!(bucket.try_consume());
        }
        assert!(!bucket.try_consume());
    }

    #[test]
    #[cfg_attr(miri, ignore = "Time-based test not compatible with Miri")]
    fn bucket_refills_over_time() {
        let mut bucket = TokenBucket::new(10, Duration::from_secs(1));

        for _ in 0..10 {
            bucket.try_consume();
        }
        assert!(!bucket.try_consume());

        // Simulate half an interval passing
        bucket.last_refill = Instant::now()
            .checked_sub(Duration::from_millis(500))
            .unwrap();
        bucket.refill();

        assert!(bucket.tokens >= 4.9 && bucket.tokens <= 5.1);
        assert!(bucket.try_consume());
    }

    #[test]
    fn wait_time_is_zero_while_tokens_remain() {
        let mut bucket = TokenBucket::new(2, Duration::from_secs(1));
        assert_eq!(bucket.time_until_available(), Duration::ZERO);
    }

    #[tokio::test]
    async fn acquire_within_budget_does_not_wait() {
        let limiter = RateLimiter::new(3, 1000);
        let start = Instant::now();

        for _ in 0..3 {
            limiter.acquire().await;
        }

        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn acquire_beyond_budget_waits_rather_than_fails() {
        let limiter = RateLimiter::new(2, 100);

        limiter.acquire().await;
        limiter.acquire().await;

        let start = Instant::now();
        limiter.acquire().await;

        // The third acquire had to wait for a refill
        assert!(start.elapsed() >= Duration::from_millis(30));
    }
}
