//! Merge of provider batches into one ordered sequence.
//!
//! # Invariants
//! - Output order is `occurred_at_ms DESC, kind ASC, source_id ASC`.
//! - Items failing `TimelineItem::validate()` never reach the caller.
//! - One `(provider, source_id)` pair appears at most once.
//! - Filters are re-applied here even though providers already honor them.

use crate::model::item::{ProviderKind, TimelineItem};
use crate::timeline::filter::HistoryFilter;
use log::warn;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Merges provider outputs, validating, deduplicating and re-filtering.
pub fn merge(
    batches: impl IntoIterator<Item = Vec<TimelineItem>>,
    filter: &HistoryFilter,
) -> Vec<TimelineItem> {
    let mut seen: HashSet<(ProviderKind, String)> = HashSet::new();
    let mut merged = Vec::new();

    for item in batches.into_iter().flatten() {
        if let Err(err) = item.validate() {
            warn!(
                "event=item_drop module=timeline status=skip reason=invalid provider={} source_id={} error={}",
                item.provider,
                item.source_id.as_deref().unwrap_or("-"),
                err
            );
            continue;
        }
        if let Some(source_id) = &item.source_id {
            if !seen.insert((item.provider, source_id.clone())) {
                warn!(
                    "event=item_drop module=timeline status=skip reason=duplicate provider={} source_id={}",
                    item.provider, source_id
                );
                continue;
            }
        }
        if filter.admits(&item) {
            merged.push(item);
        }
    }

    merged.sort_by(timeline_order);
    merged
}

/// Newest first; ties broken by kind, then source id.
pub fn timeline_order(a: &TimelineItem, b: &TimelineItem) -> Ordering {
    b.occurred_at_ms
        .cmp(&a.occurred_at_ms)
        .then_with(|| a.kind.cmp(&b.kind))
        .then_with(|| a.source_id.cmp(&b.source_id))
}
