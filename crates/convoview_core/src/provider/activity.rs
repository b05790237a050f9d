//! Call/task provider.
//!
//! # Responsibility
//! - List completed call-type tasks logged against the identity.
//! - Recover the dialed number from the task description.
//!
//! # Invariants
//! - Only `status = 'Completed'` tasks with subtype `Call` are listed.
//! - A missing duration is reported as zero seconds.

use crate::db::DbPool;
use crate::model::detail::{CallDetail, CallSource, RecordDetail};
use crate::model::item::{duration_label, EpochMs, ProviderKind, TimelineItem};
use crate::provider::{
    collect_items, non_blank, FetchRequest, ProviderResult, TimelineProvider,
};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{params, OptionalExtension, Row};

const BACKING_TYPES: &[&str] = &["tasks"];

static PHONE_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*phone\s*:\s*(.+?)\s*$").expect("valid phone line regex"));
static NON_DIGIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\D").expect("valid digit regex"));

const TASK_COLUMNS: &str = "id,
    subject,
    description,
    status,
    call_duration_seconds,
    owner_name,
    created_by,
    recording_id,
    COALESCE(completed_at, created_at) AS occurred_at";

#[derive(Debug)]
struct TaskRow {
    id: String,
    subject: Option<String>,
    description: Option<String>,
    status: String,
    duration: u32,
    owner_name: Option<String>,
    created_by: Option<String>,
    recording_id: Option<String>,
    occurred_at: EpochMs,
}

impl TaskRow {
    fn decode(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            subject: row.get("subject")?,
            description: row.get("description")?,
            status: row.get("status")?,
            duration: row
                .get::<_, Option<u32>>("call_duration_seconds")?
                .unwrap_or(0),
            owner_name: row.get("owner_name")?,
            created_by: row.get("created_by")?,
            recording_id: row.get("recording_id")?,
            occurred_at: row.get("occurred_at")?,
        })
    }

    fn to_item(&self) -> TimelineItem {
        TimelineItem::call(ProviderKind::Activity, &self.id, self.occurred_at, self.duration)
            .with_subject(non_blank(self.subject.clone()))
            .with_body(non_blank(self.description.clone()))
            .with_phone(self.description.as_deref().and_then(phone_from_description))
    }
}

/// Extracts the digits of a `Phone: ...` line, as dialer integrations write
/// into task descriptions.
pub fn phone_from_description(description: &str) -> Option<String> {
    let line = PHONE_LINE_RE.captures(description)?.get(1)?.as_str();
    let digits = NON_DIGIT_RE.replace_all(line, "");
    if digits.is_empty() {
        None
    } else {
        Some(digits.into_owned())
    }
}

/// Completed call tasks from the activity store.
pub struct ActivityProvider {
    pool: DbPool,
}

impl ActivityProvider {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl TimelineProvider for ActivityProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Activity
    }

    fn backing_types(&self) -> &'static [&'static str] {
        BACKING_TYPES
    }

    fn fetch(&self, request: &FetchRequest) -> ProviderResult<Vec<TimelineItem>> {
        if !request.filter.admits_kind(self.item_kind()) {
            return Ok(Vec::new());
        }

        let conn = self.pool.get()?;
        let sql = format!(
            "SELECT {TASK_COLUMNS}
             FROM tasks
             WHERE identity_id = ?1
               AND status = 'Completed'
               AND task_subtype = 'Call'
               AND (?2 IS NULL OR COALESCE(completed_at, created_at) >= ?2)
               AND (?3 IS NULL OR COALESCE(completed_at, created_at) < ?3)
             ORDER BY occurred_at DESC, id ASC;"
        );
        collect_items(
            &conn,
            self.kind(),
            &sql,
            params![
                request.identity_id,
                request.filter.window.start_ms,
                request.filter.window.end_ms,
            ],
            TaskRow::decode,
            TaskRow::to_item,
            request,
        )
    }

    fn resolve(&self, record_id: &str) -> ProviderResult<Option<RecordDetail>> {
        let conn = self.pool.get()?;
        let task = conn
            .query_row(
                &format!(
                    "SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1 AND task_subtype = 'Call';"
                ),
                [record_id],
                TaskRow::decode,
            )
            .optional()?;

        Ok(task.map(|task| {
            let record = task.to_item();
            let call = CallDetail {
                source: CallSource::Task,
                owner_name: task.owner_name.clone(),
                created_by: task.created_by.clone(),
                status: Some(task.status.clone()),
                notes: non_blank(task.description.clone()),
                phone: record.phone.clone(),
                recording_id: non_blank(task.recording_id.clone()),
                duration_label: duration_label(task.duration),
                started_at_ms: None,
                ended_at_ms: None,
                session_name: None,
            };
            RecordDetail {
                call: Some(call),
                ..RecordDetail::single(record)
            }
        }))
    }
}
