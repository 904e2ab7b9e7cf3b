//! Per-key sliding-window rate limiting.

use dashmap::DashMap;
use nextkey_types::Clock;
use std::collections::VecDeque;
use std::sync::Arc;

/// Allows at most `max` events per `window` seconds for each key.
pub struct SlidingWindowLimiter {
    max: usize,
    window: i64,
    clock: Arc<dyn Clock>,
    hits: DashMap<String, VecDeque<i64>>,
}

impl SlidingWindowLimiter {
    pub fn new(max: usize, window_secs: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            max,
            window: window_secs,
            clock,
            hits: DashMap::new(),
        }
    }

    /// Records an event for `key` if it is within the limit.
    pub fn allow(&self, key: &str) -> bool {
        let now = self.clock.now();
        let mut hits = self.hits.entry(key.to_string()).or_default();
        evict(&mut hits, now, self.window);
        if hits.len() >= self.max {
            return false;
        }
        hits.push_back(now);
        true
    }

    /// Drops keys with no events inside the window. Returns how many were removed.
    pub fn cleanup(&self) -> usize {
        let now = self.clock.now();
        let before = self.hits.len();
        self.hits.retain(|_, hits| {
            evict(hits, now, self.window);
            !hits.is_empty()
        });
        before.saturating_sub(self.hits.len())
    }

    /// Number of keys currently tracked.
    pub fn tracked(&self) -> usize {
        self.hits.len()
    }
}

impl std::fmt::Debug for SlidingWindowLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlidingWindowLimiter")
            .field("max", &self.max)
            .field("window", &self.window)
            .field("tracked", &self.hits.len())
            .finish()
    }
}

fn evict(hits: &mut VecDeque<i64>, now: i64, window: i64) {
    while hits.front().is_some_and(|&t| now - t >= window) {
        hits.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nextkey_types::ManualClock;

    fn limiter(max: usize, window: i64) -> (SlidingWindowLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000));
        (SlidingWindowLimiter::new(max, window, clock.clone()), clock)
    }

    #[test]
    fn denies_past_limit() {
        let (limiter, _) = limiter(5, 60);
        for _ in 0..5 {
            assert!(limiter.allow("1.2.3.4"));
        }
        assert!(!limiter.allow("1.2.3.4"));
    }

    #[test]
    fn keys_are_independent() {
        let (limiter, _) = limiter(1, 60);
        assert!(limiter.allow("a"));
        assert!(limiter.allow("b"));
        assert!(!limiter.allow("a"));
    }

    #[test]
    fn window_slides() {
        let (limiter, clock) = limiter(2, 60);
        assert!(limiter.allow("k"));
        clock.advance(30);
        assert!(limiter.allow("k"));
        assert!(!limiter.allow("k"));

        clock.advance(30);
        assert!(limiter.allow("k"));
        assert!(!limiter.allow("k"));
    }

    #[test]
    fn denied_attempts_do_not_extend_the_window() {
        let (limiter, clock) = limiter(1, 60);
        assert!(limiter.allow("k"));
        for _ in 0..10 {
            clock.advance(5);
            assert!(!limiter.allow("k"));
        }
        clock.advance(10);
        assert!(limiter.allow("k"));
    }

    #[test]
    fn cleanup_drops_idle_keys() {
        let (limiter, clock) = limiter(5, 60);
        limiter.allow("old");
        clock.advance(45);
        limiter.allow("new");
        clock.advance(20);

        assert_eq!(limiter.cleanup(), 1);
        assert_eq!(limiter.tracked(), 1);
    }
}
