//! Date windows and day arithmetic.
//!
//! All schedule dates are inclusive calendar days. A task of duration `d`
//! starting on `s` finishes on `s + d - 1`, so a one-day task starts and
//! finishes on the same date.
//!
//! Every shift is checked: a result outside the calendar range chrono can
//! represent is `None`, never a panic.

use chrono::{NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};

/// Longest duration, and largest absolute lag, a record may carry.
pub const MAX_SPAN_DAYS: i64 = 100 * 366;

/// Whether a duration is positive and within [`MAX_SPAN_DAYS`].
pub fn is_valid_duration(duration_days: i64) -> bool {
    (1..=MAX_SPAN_DAYS).contains(&duration_days)
}

/// Whether a lag is within [`MAX_SPAN_DAYS`] either way.
pub fn is_valid_lag(lag_days: i64) -> bool {
    (-MAX_SPAN_DAYS..=MAX_SPAN_DAYS).contains(&lag_days)
}

/// Shifts a date by a signed number of days, `None` when out of range.
#[inline]
pub fn add_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    TimeDelta::try_days(days).and_then(|delta| date.checked_add_signed(delta))
}

/// Signed number of days from `from` to `to`.
#[inline]
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// An inclusive `[start, end]` date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateWindow {
    /// First working day.
    pub start: NaiveDate,
    /// Last working day (inclusive).
    pub end: NaiveDate,
}

impl DateWindow {
    /// Creates a window from explicit bounds.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Window anchored at `start` lasting `duration_days`.
    pub fn from_start(start: NaiveDate, duration_days: i64) -> Option<Self> {
        let end = add_days(start, duration_days.checked_sub(1)?)?;
        Some(Self { start, end })
    }

    /// Window anchored at `end` lasting `duration_days`.
    pub fn from_finish(end: NaiveDate, duration_days: i64) -> Option<Self> {
        let start = add_days(end, 1i64.checked_sub(duration_days)?)?;
        Some(Self { start, end })
    }

    /// Inclusive length in days.
    pub fn duration_days(&self) -> i64 {
        days_between(self.start, self.end) + 1
    }

    /// Whether `end` is not before `start`.
    pub fn is_valid(&self) -> bool {
        self.end >= self.start
    }
}

/// A task window before and after a scheduling pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskWindow {
    /// Task whose dates moved.
    pub task_id: String,
    /// Window before the pass.
    pub old: DateWindow,
    /// Window after the pass.
    pub new: DateWindow,
}

impl TaskWindow {
    /// Signed shift of the start date in days.
    pub fn shift_days(&self) -> i64 {
        days_between(self.old.start, self.new.start)
    }
}
