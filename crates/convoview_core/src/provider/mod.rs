//! Provider adapters: one per source kind.
//!
//! # Responsibility
//! - Define the uniform fetch/resolve contract every source implements.
//! - Provide the SQLite-backed reference adapters and the identity lookup.
//!
//! # Invariants
//! - Adapters are read-only.
//! - A provider whose kind is excluded by the type filter issues no query.
//! - A record that fails to decode or validate is skipped and logged; it
//!   never aborts the rest of the fetch.
//! - Returned items are ordered `occurred_at_ms DESC, source_id ASC`.

use crate::db::DbError;
use crate::model::detail::RecordDetail;
use crate::model::item::{ItemKind, ProviderKind, TimelineItem};
use crate::timeline::filter::HistoryFilter;
use log::warn;
use rusqlite::{Connection, Params, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod activity;
pub mod conversation;
pub mod dialer;
pub mod identity;
pub mod sms;
pub mod step_log;

pub use activity::ActivityProvider;
pub use conversation::ConversationProvider;
pub use dialer::DialerProvider;
pub use identity::{IdentityDirectory, SqliteIdentityDirectory};
pub use sms::SmsProvider;
pub use step_log::StepLogProvider;

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Source-level failure. Callers treat it as "no items from this source".
#[derive(Debug)]
pub enum ProviderError {
    Db(DbError),
    Unavailable(String),
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Unavailable(message) => write!(f, "source unavailable: {message}"),
        }
    }
}

impl Error for ProviderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for ProviderError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for ProviderError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<r2d2::Error> for ProviderError {
    fn from(value: r2d2::Error) -> Self {
        Self::Db(DbError::Pool(value))
    }
}

/// One provider query for one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub identity_id: String,
    pub filter: HistoryFilter,
    /// Most items the merged page can need from one source; `None` = all.
    /// Counted after decoding, validation and filtering.
    pub limit: Option<usize>,
}

/// Uniform contract implemented by every timeline source.
pub trait TimelineProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn item_kind(&self) -> ItemKind {
        self.kind().item_kind()
    }

    /// Catalog type names that must all be registered for this provider to
    /// be active.
    fn backing_types(&self) -> &'static [&'static str];

    /// Fetches normalized items for one identity honoring `request.filter`.
    fn fetch(&self, request: &FetchRequest) -> ProviderResult<Vec<TimelineItem>>;

    /// Re-fetches one record with enrichment. `Ok(None)` when unknown.
    fn resolve(&self, record_id: &str) -> ProviderResult<Option<RecordDetail>>;
}

/// Runs `sql` and decodes every row, skipping rows that fail to decode.
pub(crate) fn query_rows<T, P: Params>(
    conn: &Connection,
    provider: ProviderKind,
    sql: &str,
    params: P,
    decode: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
) -> ProviderResult<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, decode)?;
    let mut decoded = Vec::new();
    for (index, row) in rows.enumerate() {
        match row {
            Ok(value) => decoded.push(value),
            Err(err) => warn!(
                "event=record_skip module=provider status=skip provider={provider} row={index} reason=decode error={err}"
            ),
        }
    }
    Ok(decoded)
}

/// Streams query rows into normalized items for a history fetch.
///
/// Rows that fail to decode or validate are skipped and logged. Iteration
/// stops as soon as `request.limit` admitted items are collected, so skipped
/// rows never consume page slots.
pub(crate) fn collect_items<R, P: Params>(
    conn: &Connection,
    provider: ProviderKind,
    sql: &str,
    params: P,
    decode: impl FnMut(&Row<'_>) -> rusqlite::Result<R>,
    normalize: impl Fn(&R) -> TimelineItem,
    request: &FetchRequest,
) -> ProviderResult<Vec<TimelineItem>> {
    let limit = request.limit.unwrap_or(usize::MAX);
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, decode)?;
    let mut items = Vec::new();
    for (index, row) in rows.enumerate() {
        if items.len() >= limit {
            break;
        }
        let row = match row {
            Ok(row) => row,
            Err(err) => {
                warn!(
                    "event=record_skip module=provider status=skip provider={provider} row={index} reason=decode error={err}"
                );
                continue;
            }
        };
        let item = normalize(&row);
        if let Err(err) = item.validate() {
            warn!(
                "event=record_skip module=provider status=skip provider={provider} source_id={} reason=invalid error={err}",
                item.source_id.as_deref().unwrap_or("-"),
            );
            continue;
        }
        if request.filter.admits(&item) {
            items.push(item);
        }
    }
    Ok(items)
}

/// Trims and drops empty text columns.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{collect_items, FetchRequest};
    use crate::model::item::{ProviderKind, TimelineItem};
    use crate::timeline::filter::HistoryFilter;
    use rusqlite::Connection;

    fn seeded() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE rows (id TEXT NOT NULL, at INTEGER);
             INSERT INTO rows VALUES ('newest', 'not a number');
             INSERT INTO rows VALUES ('threaded', 0);
             INSERT INTO rows VALUES ('middle', 2000);
             INSERT INTO rows VALUES ('oldest', 1000);",
        )
        .unwrap();
        conn
    }

    fn fetch(conn: &Connection, limit: Option<usize>) -> Vec<String> {
        let request = FetchRequest {
            identity_id: "lead-1".to_string(),
            filter: HistoryFilter::default(),
            limit,
        };
        collect_items(
            conn,
            ProviderKind::Sms,
            "SELECT id, at FROM rows ORDER BY rowid ASC;",
            [],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
            |(id, at)| {
                let mut item = TimelineItem::sms(id, *at);
                if id == "threaded" {
                    item.conversation_id = Some("c1".to_string());
                }
                item
            },
            &request,
        )
        .unwrap()
        .into_iter()
        .filter_map(|item| item.source_id)
        .collect()
    }

    #[test]
    fn skipped_rows_do_not_consume_the_limit() {
        let conn = seeded();
        assert_eq!(fetch(&conn, Some(1)), vec!["middle"]);
        assert_eq!(fetch(&conn, Some(2)), vec!["middle", "oldest"]);
        assert_eq!(fetch(&conn, None), vec!["middle", "oldest"]);
    }
}
