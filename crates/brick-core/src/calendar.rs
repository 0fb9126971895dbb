//! # Day of Month
//!
//! [`Day`] is a recurrence rule ("the 10th of every month"), not a calendar
//! date. Any value in `MIN_DAY..=MAX_DAY` is accepted regardless of month, so
//! day 31 is legal even though some months end earlier.
//!
//! ## Distance arithmetic
//!
//! [`Day::days_until`] and [`Day::days_overdue`] measure from a reference date
//! to the next (or last) occurrence of the day number. When the occurrence
//! falls in the adjacent month, the distance wraps using that month's length
//! with no clamping. For a day number beyond the adjacent month's last day the
//! result can therefore overshoot, or go negative for `days_overdue`
//! (day 31 seen from March 29 gives `29 - 31 + 29 = 27` in a leap year, and
//! day 31 from March 1 of a common year gives `28 - 31 + 1 = -2`).
//!
//! "The previous month" is found by stepping the reference date back one
//! month with day overflow carried forward, the way calendar date
//! normalization does. When the reference day does not exist in the previous
//! month (March 30 stepped back lands on "February 30", which normalizes to
//! March 1 or 2), the length used is that of the reference date's own month.

use chrono::{Datelike, NaiveDate};

use crate::error::BrickError;
use crate::primitive::{impl_integer_codecs, must, IntegerPrimitive};

/// Smallest accepted day number.
pub const MIN_DAY: u8 = 1;
/// Largest accepted day number.
pub const MAX_DAY: u8 = 31;

/// A day-of-month number in `1..=31`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Day(u8);

impl Day {
    /// Validate a day number.
    ///
    /// # Errors
    ///
    /// Invalid input outside `1..=31`, with the value under `input_value`.
    pub fn new(value: i64) -> Result<Self, BrickError> {
        Self::from_i64(value)
    }

    /// Like [`Day::new`], aborting the process on an out-of-range value.
    pub fn must_new(value: i64) -> Self {
        must(Self::new(value))
    }

    /// The day number.
    pub fn get(&self) -> u8 {
        self.0
    }

    /// Whether this day has already gone by in `today`'s month.
    pub fn has_passed(&self, today: impl Datelike) -> bool {
        u32::from(self.0) < today.day()
    }

    /// Days from `today` to the next occurrence of this day; zero on the day
    /// itself.
    pub fn days_until(&self, today: impl Datelike) -> i64 {
        let day = i64::from(self.0);
        let today_day = i64::from(today.day());
        if day >= today_day {
            return day - today_day;
        }
        days_in_month(today.year(), today.month()) - today_day + day
    }

    /// Days since the last occurrence of this day; zero on the day itself.
    pub fn days_overdue(&self, today: impl Datelike) -> i64 {
        let day = i64::from(self.0);
        let today_day = i64::from(today.day());
        if day <= today_day {
            return today_day - day;
        }
        let (year, month) = month_before(today.year(), today.month(), today.day());
        days_in_month(year, month) - day + today_day
    }
}

/// Year and month of the date one month before `year-month-day`, with a day
/// past the end of the earlier month rolling over into the following one.
fn month_before(year: i32, month: u32, day: u32) -> (i32, u32) {
    let (prev_year, prev_month) = match month {
        1 => (year - 1, 12),
        m => (year, m - 1),
    };
    // Months are at least 28 days long, so the overflow never leaves `month`.
    if i64::from(day) > days_in_month(prev_year, prev_month) {
        (year, month)
    } else {
        (prev_year, prev_month)
    }
}

/// Number of days in a calendar month.
fn days_in_month(year: i32, month: u32) -> i64 {
    let (next_year, next_month) = match month {
        12 => (year + 1, 1),
        m => (year, m + 1),
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map_or(i64::from(MAX_DAY), |last| i64::from(last.day()))
}

impl IntegerPrimitive for Day {
    const TYPE_NAME: &'static str = "Day";

    fn from_i64(value: i64) -> Result<Self, BrickError> {
        u8::try_from(value)
            .ok()
            .filter(|d| (MIN_DAY..=MAX_DAY).contains(d))
            .map(Self)
            .ok_or_else(|| {
                BrickError::validation(format!(
                    "Day must be between {MIN_DAY} and {MAX_DAY} (received: {value})."
                ))
                .with_context("input_value", value)
                .with_context("min_day", MIN_DAY)
                .with_context("max_day", MAX_DAY)
            })
    }

    fn to_i64(&self) -> i64 {
        i64::from(self.0)
    }
}

impl TryFrom<i64> for Day {
    type Error = BrickError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Day> for i64 {
    fn from(day: Day) -> Self {
        i64::from(day.0)
    }
}

impl_integer_codecs!(Day);
