//! Time source used for protocol settle delays and idle tracking.
//!
//! Hardware settle delays are real waits in production. Tests substitute a
//! manual clock whose `sleep` advances virtual time instantly.

use std::time::{Duration, Instant};

/// Monotonic time plus blocking sleep.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// Wall-clock implementation backed by `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
