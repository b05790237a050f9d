//! Pagination and date grouping of the merged timeline.
//!
//! # Invariants
//! - Pagination applies to the flattened ordered sequence, before grouping.
//! - Groups keep first-appearance order, which is display order because
//!   labels are monotone in time.
//! - Empty groups are never emitted.

use crate::model::item::TimelineItem;
use crate::timeline::calendar::CalendarSnapshot;
use indexmap::IndexMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Ordered mapping from group label to the items in that group.
pub type GroupedHistory = IndexMap<String, Vec<TimelineItem>>;

/// Validated page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    size: usize,
    offset: usize,
}

impl PageRequest {
    /// Validates raw caller paging and clamps `page_size` to `max_page_size`.
    pub fn new(page_size: i64, page_offset: i64, max_page_size: usize) -> Result<Self, PageError> {
        if page_size <= 0 {
            return Err(PageError::NonPositiveSize(page_size));
        }
        if page_offset < 0 {
            return Err(PageError::NegativeOffset(page_offset));
        }
        let size = usize::try_from(page_size)
            .unwrap_or(usize::MAX)
            .min(max_page_size.max(1));
        let offset = usize::try_from(page_offset).unwrap_or(usize::MAX);
        Ok(Self { size, offset })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Rows each source must supply for this page to be exact.
    pub fn fetch_limit(&self) -> usize {
        self.offset.saturating_add(self.size)
    }
}

/// Caller paging contract violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageError {
    NonPositiveSize(i64),
    NegativeOffset(i64),
}

impl Display for PageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonPositiveSize(value) => write!(f, "page size must be positive, got {value}"),
            Self::NegativeOffset(value) => {
                write!(f, "page offset must not be negative, got {value}")
            }
        }
    }
}

impl Error for PageError {}

/// Slices `page` out of `ordered` and buckets the survivors by label.
pub fn group_page(
    ordered: Vec<TimelineItem>,
    page: PageRequest,
    calendar: &CalendarSnapshot,
) -> GroupedHistory {
    let mut grouped = GroupedHistory::new();
    for item in ordered.into_iter().skip(page.offset).take(page.size) {
        grouped
            .entry(calendar.group_label(item.occurred_at_ms))
            .or_default()
            .push(item);
    }
    grouped
}
