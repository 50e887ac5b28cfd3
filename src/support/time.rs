//! Wall-clock access behind a trait so hour-of-day logic is testable

use chrono::{DateTime, Local, Timelike, Utc};

pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;

    /// Hour of day (0-23) in the operator's local time zone
    fn local_hour(&self) -> u32;
}

/// Reads the system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_hour(&self) -> u32 {
        Local::now().hour()
    }
}

/// Frozen clock; `local_hour` reports the UTC hour of the instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    at: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self { at }
    }
}

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.at
    }

    fn local_hour(&self) -> u32 {
        self.at.hour()
    }
}
