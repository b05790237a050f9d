//! Identity-local calendar arithmetic.
//!
//! # Responsibility
//! - Freeze `now` once per request and derive day/week/month boundaries.
//! - Map timestamps to relative group labels.
//!
//! # Invariants
//! - Boundaries are local midnights in the identity's fixed UTC offset.
//! - Group labels are monotone: a later timestamp never gets a label that
//!   sorts after an earlier timestamp's label.

use crate::model::item::EpochMs;
use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, Weekday};

pub const LABEL_UPCOMING: &str = "Upcoming";
pub const LABEL_TODAY: &str = "Today";
pub const LABEL_YESTERDAY: &str = "Yesterday";
pub const LABEL_THIS_WEEK: &str = "Earlier This Week";
pub const LABEL_LAST_WEEK: &str = "Last Week";
pub const LABEL_THIS_MONTH: &str = "Earlier This Month";
const LABEL_UNDATED: &str = "Earlier";

const MS_PER_MINUTE: i64 = 60_000;

/// Fixed snapshot of "now" in one identity's calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarSnapshot {
    offset_ms: i64,
    week_starts_on: Weekday,
    today: NaiveDate,
}

impl CalendarSnapshot {
    pub fn new(now_ms: EpochMs, utc_offset_minutes: i32, week_starts_on: Weekday) -> Self {
        let offset_ms = i64::from(utc_offset_minutes) * MS_PER_MINUTE;
        let today = local_date(now_ms, offset_ms).unwrap_or_default();
        Self {
            offset_ms,
            week_starts_on,
            today,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Local calendar date of `ts`, `None` when out of chrono's range.
    pub fn date_of(&self, ts: EpochMs) -> Option<NaiveDate> {
        local_date(ts, self.offset_ms)
    }

    /// Epoch ms of local midnight at the start of `date`.
    pub fn start_of(&self, date: NaiveDate) -> EpochMs {
        date.and_time(NaiveTime::MIN).and_utc().timestamp_millis() - self.offset_ms
    }

    pub fn yesterday(&self) -> NaiveDate {
        days_before(self.today, 1)
    }

    pub fn tomorrow(&self) -> NaiveDate {
        self.today
            .checked_add_days(Days::new(1))
            .unwrap_or(self.today)
    }

    pub fn week_start(&self) -> NaiveDate {
        let today = self.today.weekday().num_days_from_monday();
        let first = self.week_starts_on.num_days_from_monday();
        days_before(self.today, u64::from((7 + today - first) % 7))
    }

    pub fn last_week_start(&self) -> NaiveDate {
        days_before(self.week_start(), 7)
    }

    pub fn next_week_start(&self) -> NaiveDate {
        self.week_start()
            .checked_add_days(Days::new(7))
            .unwrap_or(self.today)
    }

    pub fn month_start(&self) -> NaiveDate {
        self.today.with_day(1).unwrap_or(self.today)
    }

    pub fn last_month_start(&self) -> NaiveDate {
        let month_start = self.month_start();
        month_start
            .checked_sub_months(Months::new(1))
            .unwrap_or(month_start)
    }

    pub fn next_month_start(&self) -> NaiveDate {
        let month_start = self.month_start();
        month_start
            .checked_add_months(Months::new(1))
            .unwrap_or(month_start)
    }

    /// Relative group label for `ts`.
    pub fn group_label(&self, ts: EpochMs) -> String {
        let Some(date) = self.date_of(ts) else {
            return LABEL_UNDATED.to_string();
        };

        let label = if date > self.today {
            LABEL_UPCOMING
        } else if date == self.today {
            LABEL_TODAY
        } else if date == self.yesterday() {
            LABEL_YESTERDAY
        } else if date >= self.week_start() {
            LABEL_THIS_WEEK
        } else if date >= self.last_week_start() {
            LABEL_LAST_WEEK
        } else if date >= self.month_start() {
            LABEL_THIS_MONTH
        } else {
            return date.format("%B %Y").to_string();
        };
        label.to_string()
    }
}

fn local_date(ts: EpochMs, offset_ms: i64) -> Option<NaiveDate> {
    let shifted = ts.checked_add(offset_ms)?;
    DateTime::from_timestamp_millis(shifted).map(|dt| dt.date_naive())
}

fn days_before(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_sub_days(Days::new(days)).unwrap_or(date)
}
