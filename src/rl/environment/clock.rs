//! Simulation clock
//!
//! One tick is half a trading day: even ticks are the open session, odd
//! ticks the close. The date of tick `t` is `start + floor(t / 2)` days, so
//! tick -1 (the pre-reset position) is the close of the day before `start`.

use chrono::{Days, NaiveDate};

use crate::data::{days_between, PriceSeries, Session};
use crate::error::EnvError;

/// Increment at which the search for the next trading date gives up
pub const MAX_CALENDAR_SEARCH: i64 = 20;

/// Tick counter anchored at a start date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimClock {
    start_date: NaiveDate,
    tick: i64,
    max_ticks: i64,
}

impl SimClock {
    /// Create a clock for `[start_date, end_date]`, positioned at tick -1
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self, EnvError> {
        let days = days_between(start_date, end_date);
        if days < 0 {
            return Err(EnvError::InvalidDateRange {
                start: start_date,
                end: end_date,
            });
        }

        Ok(Self {
            start_date,
            tick: -1,
            max_ticks: days * 2,
        })
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn tick(&self) -> i64 {
        self.tick
    }

    /// Episode bound: twice the number of days in the range
    pub fn max_ticks(&self) -> i64 {
        self.max_ticks
    }

    /// Whole days between start and end date
    pub fn total_days(&self) -> i64 {
        self.max_ticks / 2
    }

    pub fn set_tick(&mut self, tick: i64) {
        self.tick = tick;
    }

    /// Date of `tick`, or `None` when it falls outside chrono's calendar
    pub fn date_for_tick(&self, tick: i64) -> Option<NaiveDate> {
        let offset = tick.div_euclid(2);
        if offset >= 0 {
            self.start_date.checked_add_days(Days::new(offset.unsigned_abs()))
        } else {
            self.start_date.checked_sub_days(Days::new(offset.unsigned_abs()))
        }
    }

    /// Date of the current tick.
    ///
    /// Ticks only move through `advance`, which rejects unrepresentable
    /// dates, so the start-date fallback is reachable only through `set_tick`.
    pub fn date(&self) -> NaiveDate {
        self.date_for_tick(self.tick).unwrap_or(self.start_date)
    }

    pub fn session(&self) -> Session {
        Session::for_tick(self.tick)
    }

    pub fn date_and_time(&self) -> (NaiveDate, Session) {
        (self.date(), self.session())
    }

    pub fn is_done(&self) -> bool {
        self.tick >= self.max_ticks
    }

    /// Advance to the next tick whose date is present in `reference`.
    ///
    /// Missing dates (weekends, holidays) are skipped by growing the
    /// increment one tick at a time. Returns the tick delta actually taken,
    /// which is more than 1 whenever non-trading days were skipped.
    pub fn advance(&mut self, reference: &PriceSeries) -> Result<i64, EnvError> {
        let candidate_at = |increment: i64| {
            let tick = self.tick + increment;
            self.date_for_tick(tick).ok_or(EnvError::DateOutOfRange {
                start: self.start_date,
                tick,
            })
        };

        let mut increment = 1;
        let mut candidate = candidate_at(increment)?;

        while !reference.contains(candidate) {
            increment += 1;
            candidate = candidate_at(increment)?;
            if increment >= MAX_CALENDAR_SEARCH {
                return Err(EnvError::CalendarSearchExhausted {
                    date: candidate,
                    attempts: increment,
                });
            }
        }

        self.tick += increment;
        Ok(increment)
    }
}
