//! # Fibonacci Backoff
//!
//! Default retry delay for failed reconciliations that do not request an
//! explicit requeue delay. Grows more slowly than exponential backoff so a
//! record stuck on a persistent host conflict is retried steadily without
//! hammering the API server or the `ip` tool.
//!
//! Sequence with the defaults: 5s, 5s, 10s, 15s, 25s, 40s, 65s, 105s, 170s, 275s, 300s (max).

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::warn;

/// Smallest default backoff
pub const DEFAULT_MIN_BACKOFF: Duration = Duration::from_secs(5);

/// Largest default backoff
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(300);

/// Fibonacci backoff calculator
///
/// Each backoff is the sum of the previous two, capped at `max`.
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    /// Minimum backoff (for reset)
    min: Duration,
    /// Previous backoff
    prev: Duration,
    /// Current backoff
    current: Duration,
    /// Maximum backoff
    max: Duration,
}

impl Default for FibonacciBackoff {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_BACKOFF, DEFAULT_MAX_BACKOFF)
    }
}

impl FibonacciBackoff {
    /// Create a new Fibonacci backoff between `min` and `max`
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            prev: Duration::ZERO,
            current: min,
            max,
        }
    }

    /// Get the next backoff duration and advance the sequence
    pub fn next_backoff(&mut self) -> Duration {
        let result = self.current;

        let next = self.prev.saturating_add(self.current);
        self.prev = self.current;
        self.current = std::cmp::min(next, self.max);

        result
    }

    /// Reset the backoff to the initial state
    pub fn reset(&mut self) {
        self.prev = Duration::ZERO;
        self.current = self.min;
    }
}

/// Per-record backoff state, keyed by `namespace/name`
#[derive(Debug)]
pub struct BackoffTracker {
    min: Duration,
    max: Duration,
    states: Mutex<HashMap<String, FibonacciBackoff>>,
}

impl Default for BackoffTracker {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_BACKOFF, DEFAULT_MAX_BACKOFF)
    }
}

impl BackoffTracker {
    /// Create a tracker whose sequences run from `min` to `max`
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Next backoff for a record, advancing its sequence
    pub fn next_backoff(&self, key: &str) -> Duration {
        match self.states.lock() {
            Ok(mut states) => states
                .entry(key.to_string())
                .or_insert_with(|| FibonacciBackoff::new(self.min, self.max))
                .next_backoff(),
            Err(e) => {
                warn!("Failed to lock backoff states: {}, using minimum backoff", e);
                self.min
            }
        }
    }

    /// Forget a record's failures (on successful reconciliation)
    pub fn reset(&self, key: &str) {
        if let Ok(mut states) = self.states.lock() {
            states.remove(key);
        }
    }
}
