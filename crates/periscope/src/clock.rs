//! Monotonic clock abstraction
//!
//! Settling waits and budget checks go through [`Clock`] so tests can inject
//! a virtual clock that collapses delays to zero.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Monotonic time source used by the traversal for settling waits and
/// wall-clock budget checks.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current monotonic instant.
    fn now(&self) -> Instant;

    /// Suspend for the given duration.
    async fn sleep(&self, duration: Duration);
}

/// Real clock backed by `tokio::time::sleep`.
#[derive(Debug, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Deterministic clock for tests: `sleep` returns immediately and advances
/// the reported time instead.
#[derive(Debug)]
pub struct VirtualClock {
    base: Instant,
    advanced: Mutex<Duration>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            advanced: Mutex::new(Duration::ZERO),
        }
    }

    /// Manually advance the clock, e.g. to trip a wall-clock budget.
    pub fn advance(&self, by: Duration) {
        let mut advanced = self.advanced.lock().unwrap_or_else(|e| e.into_inner());
        *advanced += by;
    }

    /// Total virtual time elapsed since construction.
    pub fn elapsed(&self) -> Duration {
        *self.advanced.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for VirtualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for VirtualClock {
    fn now(&self) -> Instant {
        self.base + *self.advanced.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}
