//! # Clock
//!
//! The allocator needs "today" to pick the daily prefix. Reading it through
//! a trait keeps the allocator a pure function of `(today, existing numbers)`
//! and lets tests move time forward.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, Utc};
use std::sync::{Arc, Mutex};

/// Source of the current date and time.
pub trait Clock: Send + Sync {
    /// The current calendar date used for order numbering.
    fn today(&self) -> NaiveDate;

    /// The current instant, used for timestamps.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock. Order dates follow the shop's local calendar day.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Starts at midday UTC on `date`.
    pub fn on(date: NaiveDate) -> Self {
        let noon = (date.and_time(NaiveTime::MIN) + Duration::hours(12)).and_utc();
        ManualClock {
            current: Mutex::new(noon),
        }
    }

    /// Jumps to `date`, keeping the time of day.
    pub fn set_date(&self, date: NaiveDate) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        let time = current.time();
        *current = date.and_time(time).and_utc();
    }

    /// Moves forward by whole days.
    pub fn advance_days(&self, days: i64) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current += Duration::days(days);
    }
}

impl Clock for ManualClock {
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    fn now(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn today(&self) -> NaiveDate {
        (**self).today()
    }

    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}
