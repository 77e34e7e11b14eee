//! Time source for bin timestamps.

use chrono::Utc;

/// Source of submission times, in whole seconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now_seconds(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_seconds(&self) -> i64 {
        Utc::now().timestamp()
    }
}
