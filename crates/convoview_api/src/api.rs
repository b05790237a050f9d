//! Use-case API for host-facing calls.
//!
//! # Responsibility
//! - Expose the history and record-detail use cases with string-typed inputs.
//! - Flatten every core error into a response envelope.
//!
//! # Invariants
//! - Exported functions never panic.
//! - One database pool and one service per process, located by
//!   `CONVOVIEW_DB_PATH` on first use.

use convoview_core::config::ENV_DB_PATH;
use convoview_core::db::open_pool;
use convoview_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    ConvoHistoryService, HistoryConfig, HistoryError, HistoryQuery, RecordDetail, TimelineItem,
};
use indexmap::IndexMap;
use log::error;
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::path::PathBuf;

const DEFAULT_DB_FILE_NAME: &str = "convoview.sqlite3";
static SERVICE: OnceCell<ConvoHistoryService> = OnceCell::new();

pub const ERROR_INVALID_ARGUMENT: &str = "invalid_argument";
pub const ERROR_NOT_FOUND: &str = "not_found";
pub const ERROR_UNAVAILABLE: &str = "unavailable";

/// Health check.
pub fn ping() -> String {
    ping_inner().to_owned()
}

pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes core logging once per process.
///
/// Returns an empty string on success and the error message otherwise.
/// Repeating the call with the same `level` and `log_dir` is a no-op.
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Grouped history envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub ok: bool,
    /// `invalid_argument`, `not_found` or `unavailable` when `ok` is false.
    pub error_kind: Option<String>,
    pub message: String,
    /// Group label to items, in display order.
    pub groups: IndexMap<String, Vec<TimelineItem>>,
}

impl HistoryResponse {
    fn failure(kind: &str, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error_kind: Some(kind.to_string()),
            message: message.into(),
            groups: IndexMap::new(),
        }
    }
}

/// Record detail envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailResponse {
    pub ok: bool,
    pub error_kind: Option<String>,
    pub message: String,
    pub detail: Option<RecordDetail>,
}

impl DetailResponse {
    fn failure(kind: &str, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error_kind: Some(kind.to_string()),
            message: message.into(),
            detail: None,
        }
    }
}

/// Returns one page of an identity's conversation history.
///
/// - `type_filter`: `All|Email|Call|SMS|Custom`, anything else means `All`.
/// - `date_filter`: `All|Today|Yesterday|This Week|Last Week|This Month|Last Month|Custom`.
/// - `extra_filter`: `YYYY-MM-DD..YYYY-MM-DD` range read when `date_filter` is `Custom`.
pub fn get_convo_history(
    page_size: i64,
    page_offset: i64,
    identity_id: String,
    type_filter: String,
    date_filter: String,
    search_term: Option<String>,
    extra_filter: Option<String>,
) -> HistoryResponse {
    let query = HistoryQuery {
        page_size,
        page_offset,
        identity_id,
        type_filter,
        date_filter,
        search_term,
        extra_filter,
    };
    match shared_service() {
        Ok(service) => history_with(service, &query),
        Err(message) => HistoryResponse::failure(ERROR_UNAVAILABLE, message),
    }
}

/// Returns the enriched detail of one record of `kind`.
pub fn get_record_info(record_id: String, kind: String) -> DetailResponse {
    match shared_service() {
        Ok(service) => detail_with(service, &record_id, &kind),
        Err(message) => DetailResponse::failure(ERROR_UNAVAILABLE, message),
    }
}

fn history_with(service: &ConvoHistoryService, query: &HistoryQuery) -> HistoryResponse {
    match service.get_convo_history(query) {
        Ok(groups) => {
            let count: usize = groups.values().map(Vec::len).sum();
            HistoryResponse {
                ok: true,
                error_kind: None,
                message: if count == 0 {
                    "No history.".to_string()
                } else {
                    format!("Found {count} item(s).")
                },
                groups,
            }
        }
        Err(err) => HistoryResponse::failure(error_kind(&err), err.to_string()),
    }
}

fn detail_with(service: &ConvoHistoryService, record_id: &str, kind: &str) -> DetailResponse {
    match service.get_record_info(record_id, kind) {
        Ok(detail) => DetailResponse {
            ok: true,
            error_kind: None,
            message: "Record found.".to_string(),
            detail: Some(detail),
        },
        Err(err) => DetailResponse::failure(error_kind(&err), err.to_string()),
    }
}

fn error_kind(err: &HistoryError) -> &'static str {
    match err {
        HistoryError::NotFound(_) => ERROR_NOT_FOUND,
        HistoryError::SourceUnavailable(_) => ERROR_UNAVAILABLE,
        HistoryError::InvalidArgument(_) | HistoryError::InvalidPage(_) => ERROR_INVALID_ARGUMENT,
    }
}

fn shared_service() -> Result<&'static ConvoHistoryService, String> {
    SERVICE.get_or_try_init(|| {
        let config = HistoryConfig::from_env().map_err(|err| format!("invalid configuration: {err}"))?;
        let db_path = resolve_db_path();
        let pool = open_pool(&db_path, config.pool_size).map_err(|err| {
            error!(
                "event=api_init module=api status=error path={} error={}",
                db_path.display(),
                err
            );
            format!("database unavailable: {err}")
        })?;
        ConvoHistoryService::sqlite(pool, config).map_err(|err| format!("service setup failed: {err}"))
    })
}

fn resolve_db_path() -> PathBuf {
    std::env::var(ENV_DB_PATH)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, detail_with, error_kind, history_with, init_logging, ping,
        ERROR_INVALID_ARGUMENT, ERROR_NOT_FOUND, ERROR_UNAVAILABLE,
    };
    use convoview_core::db::open_pool;
    use convoview_core::{
        ConvoHistoryService, FixedClock, HistoryConfig, HistoryError, HistoryQuery,
    };
    use rusqlite::params;
    use std::sync::Arc;
    use tempfile::TempDir;
    use uuid::Uuid;

    const NOW: i64 = 1_792_238_400_000;

    struct Seeded {
        _dir: TempDir,
        service: ConvoHistoryService,
        identity_id: String,
        message_id: String,
    }

    fn seeded() -> Seeded {
        let dir = tempfile::tempdir().expect("tempdir");
        let pool = open_pool(dir.path().join("api.db"), 2).expect("pool");
        let identity_id = Uuid::new_v4().to_string();
        let thread_id = Uuid::new_v4().to_string();
        let message_id = Uuid::new_v4().to_string();
        {
            let conn = pool.get().expect("connection");
            conn.execute(
                "INSERT INTO identities (id, name) VALUES (?1, 'Ada Lead');",
                params![identity_id],
            )
            .expect("identity");
            conn.execute(
                "INSERT INTO conversations (id, identity_id, object_id, name, created_at)
                 VALUES (?1, ?2, 'opp-1', 'Intro', ?3);",
                params![thread_id, identity_id, NOW - 86_400_000],
            )
            .expect("thread");
            conn.execute(
                "INSERT INTO email_messages (id, conversation_id, subject, sent_at, created_at)
                 VALUES (?1, ?2, 'Hello', ?3, ?3);",
                params![message_id, thread_id, NOW - 3_600_000],
            )
            .expect("message");
        }
        let service = ConvoHistoryService::sqlite(pool, HistoryConfig::default())
            .expect("service")
            .with_clock(Arc::new(FixedClock(NOW)));
        Seeded {
            _dir: dir,
            service,
            identity_id,
            message_id,
        }
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_reports_bad_input_as_message() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
        assert!(!init_logging("verbose".to_string(), "/tmp/convoview-logs".to_string()).is_empty());
    }

    #[test]
    fn history_envelope_carries_groups() {
        let seeded = seeded();
        let response = history_with(&seeded.service, &HistoryQuery::new(&seeded.identity_id, 10));
        assert!(response.ok, "{}", response.message);
        assert!(response.error_kind.is_none());
        assert_eq!(response.groups.len(), 1);
        assert_eq!(response.groups["Today"][0].source_id.as_deref(), Some(seeded.message_id.as_str()));

        let json = serde_json_value(&response);
        assert_eq!(json["groups"]["Today"][0]["icon"], "standard:email");
    }

    #[test]
    fn history_envelope_flattens_paging_errors() {
        let seeded = seeded();
        let response = history_with(
            &seeded.service,
            &HistoryQuery::new(&seeded.identity_id, 0),
        );
        assert!(!response.ok);
        assert_eq!(response.error_kind.as_deref(), Some(ERROR_INVALID_ARGUMENT));
        assert!(response.groups.is_empty());
    }

    #[test]
    fn detail_envelope_maps_error_kinds() {
        let seeded = seeded();
        let found = detail_with(&seeded.service, &seeded.message_id, "Email");
        assert!(found.ok, "{}", found.message);
        let detail = found.detail.expect("detail");
        assert_eq!(detail.items[0].item_type, "email");

        let unknown_kind = detail_with(&seeded.service, &seeded.message_id, "Fax");
        assert_eq!(unknown_kind.error_kind.as_deref(), Some(ERROR_NOT_FOUND));

        let unknown_id = detail_with(&seeded.service, "missing", "Email");
        assert_eq!(unknown_id.error_kind.as_deref(), Some(ERROR_INVALID_ARGUMENT));
    }

    #[test]
    fn failed_sources_map_to_unavailable() {
        let err = HistoryError::SourceUnavailable("every Call source failed".to_string());
        assert_eq!(error_kind(&err), ERROR_UNAVAILABLE);
    }

    fn serde_json_value<T: serde::Serialize>(value: &T) -> serde_json::Value {
        serde_json::to_value(value).expect("serializable")
    }
}
