//! Query throttling
//!
//! The controller answers "unknown command" when queries arrive too close
//! together, so consecutive queries are spaced by a minimum interval.

use std::time::{Duration, Instant};

/// Enforces a minimum spacing between the end of one query and the start of the next
#[derive(Debug, Clone)]
pub struct QueryThrottler {
    min_interval: Duration,
    last_query: Instant,
}

impl QueryThrottler {
    /// Create a throttler; the reference point is the moment of creation
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_query: Instant::now(),
        }
    }

    /// Configured minimum interval
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// How long a query started now would have to wait
    pub fn idle_time(&self) -> Duration {
        self.min_interval.saturating_sub(self.last_query.elapsed())
    }

    /// Block until the next query may start
    pub fn wait(&self) {
        let idle = self.idle_time();
        if !idle.is_zero() {
            std::thread::sleep(idle);
        }
    }

    /// Mark the end of a query
    pub fn mark(&mut self) {
        self.last_query = Instant::now();
    }
}

impl Default for QueryThrottler {
    fn default() -> Self {
        Self::new(Duration::from_millis(super::DEFAULT_MIN_QUERY_INTERVAL_MS))
    }
}
