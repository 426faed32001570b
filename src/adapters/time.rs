//! Wall-clock time adapter.
//!
//! Telemetry timestamps and `time` boost deadlines are epoch seconds, so
//! the clock is the system wall clock rather than a monotonic timer.  A
//! clock set before 1970 reads as 0.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::app::ports::Clock;

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0.0, |d| d.as_secs_f64())
    }
}
