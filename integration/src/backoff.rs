//! Exponential backoff with a configurable cap, used by the broker gateway's
//! RPC retries (cap 3 attempts) and its tick-stream reconnect (uncapped
//! attempts, cap 30s delay) per §4.1/§7.

use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    base: Duration,
    cap: Duration,
    attempt: u32,
}

impl ExponentialBackoff {
    pub fn new(base: Duration, cap: Duration) -> Self {
        Self {
            base,
            cap,
            attempt: 0,
        }
    }

    /// The 30s-capped backoff used by the tick stream reconnect loop.
    pub fn stream_reconnect() -> Self {
        Self::new(Duration::from_millis(250), Duration::from_secs(30))
    }

    /// The backoff used between RPC retry attempts (caller still enforces
    /// the 3-attempt ceiling separately).
    pub fn rpc_retry() -> Self {
        Self::new(Duration::from_millis(100), Duration::from_secs(5))
    }

    /// Delay for the current attempt, then advances to the next.
    pub fn next_delay(&mut self) -> Duration {
        let factor = 1u32 << self.attempt.min(16);
        let delay = self.base.saturating_mul(factor).min(self.cap);
        self.attempt += 1;
        delay
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_doubles_and_caps() {
        let mut backoff = ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(5));
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
        assert_eq!(backoff.next_delay(), Duration::from_secs(2));
        assert_eq!(backoff.next_delay(), Duration::from_secs(4));
        assert_eq!(backoff.next_delay(), Duration::from_secs(5)); // capped
        assert_eq!(backoff.next_delay(), Duration::from_secs(5));
    }

    #[test]
    fn reset_restarts_from_base() {
        let mut backoff = ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(5));
        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
    }
}
