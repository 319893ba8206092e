//! Time budget tracking for a session.
//!
//! The session never reads wall-clock time directly; it samples an injected
//! [`MonotonicClock`] so tests can drive time by hand.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of monotonic time, measured from an arbitrary origin.
pub trait MonotonicClock: Send + Sync {
    fn now(&self) -> Duration;
}

/// Real clock backed by [`Instant`].
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven clock for tests and simulations.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    /// Move the clock to `at`. Moving backwards is ignored.
    pub fn set(&self, at: Duration) {
        self.millis.fetch_max(at.as_millis() as u64, Ordering::SeqCst);
    }
}

impl MonotonicClock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

// =============================================================================
// SessionClock
// =============================================================================

/// Elapsed and remaining time against a fixed session budget.
///
/// `elapsed` never decreases, even if the underlying clock misbehaves: every
/// sample is folded into a high-water mark. Safe to sample from any thread.
pub struct SessionClock {
    source: Arc<dyn MonotonicClock>,
    origin: Duration,
    budget: Duration,
    high_water_ms: AtomicU64,
}

impl SessionClock {
    /// Start a budget of `budget` measured from the current reading of `source`.
    pub fn start(source: Arc<dyn MonotonicClock>, budget: Duration) -> Self {
        let origin = source.now();
        Self {
            source,
            origin,
            budget,
            high_water_ms: AtomicU64::new(0),
        }
    }

    pub fn elapsed(&self) -> Duration {
        let sample = self.source.now().saturating_sub(self.origin).as_millis() as u64;
        let prev = self.high_water_ms.fetch_max(sample, Ordering::SeqCst);
        Duration::from_millis(prev.max(sample))
    }

    pub fn remaining(&self) -> Duration {
        self.budget.saturating_sub(self.elapsed())
    }
}

impl std::fmt::Debug for SessionClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionClock")
            .field("budget", &self.budget)
            .field("elapsed", &self.elapsed())
            .finish()
    }
}
