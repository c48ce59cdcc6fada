//! Strictly increasing timestamps for the usage ledger.
//!
//! The ledger is keyed by time, so two presentations inside the same clock
//! tick, or a wall clock that stepped backwards (a board without a battery
//! backed RTC booting before NTP sync), must still produce distinct,
//! ordered keys.

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Default)]
pub struct MonotonicClock {
    last: Option<DateTime<Utc>>,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start after `last`, typically the newest timestamp already persisted.
    pub fn seeded(last: Option<DateTime<Utc>>) -> Self {
        Self { last }
    }

    /// Next timestamp based on the current wall clock.
    pub fn now(&mut self) -> DateTime<Utc> {
        self.next_after(Utc::now())
    }

    /// Next timestamp given a wall clock reading.
    ///
    /// Returns `wall` when it is later than every value handed out so far,
    /// otherwise the previous value plus one microsecond.
    pub fn next_after(&mut self, wall: DateTime<Utc>) -> DateTime<Utc> {
        let next = match self.last {
            Some(last) if wall <= last => last + Duration::microseconds(1),
            _ => wall,
        };
        self.last = Some(next);
        next
    }

    /// Last timestamp handed out (or the seed).
    pub fn last(&self) -> Option<DateTime<Utc>> {
        self.last
    }
}
