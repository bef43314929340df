//! Time source for field names, signing dates, and expiry checks.

use chrono::{DateTime, Utc};

/// Source of the current UTC time.
pub trait Clock {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
