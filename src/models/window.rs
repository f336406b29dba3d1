//! Date windows.
//!
//! Projects and phases are bounded by a `[start, end]` pair of calendar
//! dates. Scheduling arithmetic happens on whole-day offsets relative to a
//! scheduling epoch (the project start date); this module provides the
//! conversions in both directions.

use chrono::{NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};

/// A date interval bounded by `start` and `end`.
///
/// `end - start` is the length in days. A window where `start == end` is a
/// zero-length window (a single milestone day).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    /// First day of the window.
    pub start: NaiveDate,
    /// Last day of the window.
    pub end: NaiveDate,
}

impl DateWindow {
    /// Creates a new date window.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Length of this window in days (negative if `end < start`).
    #[inline]
    pub fn duration_days(&self) -> i64 {
        days_between(self.start, self.end)
    }

    /// Whether `end` comes before `start`.
    #[inline]
    pub fn is_inverted(&self) -> bool {
        self.end < self.start
    }

    /// Whether `other` lies entirely inside this window.
    pub fn encloses(&self, other: &Self) -> bool {
        other.start >= self.start && other.end <= self.end
    }
}

/// Signed number of days from `from` to `to`.
#[inline]
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// The date `offset` days after `epoch` (before it when negative).
#[inline]
pub fn date_at(epoch: NaiveDate, offset: i64) -> NaiveDate {
    epoch + TimeDelta::days(offset)
}
