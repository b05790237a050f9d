//! Caller filter parsing and matching.
//!
//! # Responsibility
//! - Parse the string-typed type/date/search filters of the external API.
//! - Resolve relative date filters into absolute windows once per request.
//! - Decide whether one normalized item passes every filter.
//!
//! # Invariants
//! - Unrecognized type or date values degrade to "no restriction".
//! - Date windows are half-open: `start <= ts < end`.
//! - Search is a case-insensitive substring match over subject, body, phone
//!   and email; a blank term matches everything.

use crate::model::item::{EpochMs, ItemKind, TimelineItem};
use crate::timeline::calendar::CalendarSnapshot;
use chrono::{Days, NaiveDate};
use log::debug;

/// Separator between the two dates of a custom range (`2026-10-01..2026-10-15`).
pub const CUSTOM_RANGE_SEPARATOR: &str = "..";

/// Restriction on item kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeFilter {
    #[default]
    All,
    Only(ItemKind),
}

impl TypeFilter {
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Self::All;
        }
        match ItemKind::parse(trimmed) {
            Some(kind) => Self::Only(kind),
            None => {
                debug!("event=filter_parse module=timeline status=skip filter=type reason=unrecognized");
                Self::All
            }
        }
    }

    pub fn admits(self, kind: ItemKind) -> bool {
        match self {
            Self::All => true,
            Self::Only(only) => only == kind,
        }
    }
}

/// Relative or custom date restriction, before it is pinned to a calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateFilter {
    #[default]
    All,
    Today,
    Yesterday,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    /// Inclusive local dates; either side may be open.
    Custom {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
}

impl DateFilter {
    /// Parses a date filter name. `Custom` reads its range from `extra`.
    pub fn parse(value: &str, extra: Option<&str>) -> Self {
        let normalized = value
            .trim()
            .to_ascii_lowercase()
            .replace('_', " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        match normalized.as_str() {
            "" | "all" => Self::All,
            "today" => Self::Today,
            "yesterday" => Self::Yesterday,
            "this week" => Self::ThisWeek,
            "last week" => Self::LastWeek,
            "this month" => Self::ThisMonth,
            "last month" => Self::LastMonth,
            "custom" => parse_custom_range(extra.unwrap_or_default()).unwrap_or_else(|| {
                debug!("event=filter_parse module=timeline status=skip filter=date reason=bad_custom_range");
                Self::All
            }),
            _ => {
                debug!("event=filter_parse module=timeline status=skip filter=date reason=unrecognized");
                Self::All
            }
        }
    }

    /// Pins this filter to absolute bounds in `calendar`.
    pub fn window(self, calendar: &CalendarSnapshot) -> DateWindow {
        let span = |from: NaiveDate, to: NaiveDate| DateWindow {
            start_ms: Some(calendar.start_of(from)),
            end_ms: Some(calendar.start_of(to)),
        };
        match self {
            Self::All => DateWindow::unbounded(),
            Self::Today => span(calendar.today(), calendar.tomorrow()),
            Self::Yesterday => span(calendar.yesterday(), calendar.today()),
            Self::ThisWeek => span(calendar.week_start(), calendar.next_week_start()),
            Self::LastWeek => span(calendar.last_week_start(), calendar.week_start()),
            Self::ThisMonth => span(calendar.month_start(), calendar.next_month_start()),
            Self::LastMonth => span(calendar.last_month_start(), calendar.month_start()),
            Self::Custom { start, end } => DateWindow {
                start_ms: start.map(|date| calendar.start_of(date)),
                end_ms: end
                    .and_then(|date| date.checked_add_days(Days::new(1)))
                    .map(|date| calendar.start_of(date)),
            },
        }
    }
}

fn parse_custom_range(value: &str) -> Option<DateFilter> {
    let (start, end) = value.split_once(CUSTOM_RANGE_SEPARATOR)?;
    let start = parse_optional_date(start)?;
    let end = parse_optional_date(end)?;
    if start.is_none() && end.is_none() {
        return None;
    }
    Some(DateFilter::Custom { start, end })
}

/// `Some(None)` for a blank side, `None` for an unparseable one.
fn parse_optional_date(value: &str) -> Option<Option<NaiveDate>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(None);
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok().map(Some)
}

/// Absolute half-open time window in epoch ms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateWindow {
    pub start_ms: Option<EpochMs>,
    pub end_ms: Option<EpochMs>,
}

impl DateWindow {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn contains(&self, ts: EpochMs) -> bool {
        self.start_ms.map_or(true, |start| ts >= start)
            && self.end_ms.map_or(true, |end| ts < end)
    }
}

/// All filters of one request, resolved against one calendar snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HistoryFilter {
    pub type_filter: TypeFilter,
    pub window: DateWindow,
    /// Lower-cased, trimmed search term; `None` when blank.
    search: Option<String>,
}

impl HistoryFilter {
    pub fn new(type_filter: TypeFilter, window: DateWindow, search: Option<&str>) -> Self {
        let search = search
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase);
        Self {
            type_filter,
            window,
            search,
        }
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn admits_kind(&self, kind: ItemKind) -> bool {
        self.type_filter.admits(kind)
    }

    pub fn matches_search(&self, item: &TimelineItem) -> bool {
        let Some(term) = self.search.as_deref() else {
            return true;
        };
        [&item.subject, &item.body, &item.phone, &item.email]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(term))
    }

    /// Whether `item` passes the type, date and search filters.
    pub fn admits(&self, item: &TimelineItem) -> bool {
        self.admits_kind(item.kind)
            && self.window.contains(item.occurred_at_ms)
            && self.matches_search(item)
    }
}
