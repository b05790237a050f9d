//! Dialer package provider.
//!
//! # Responsibility
//! - List calls placed through the optional dialer package.
//! - Resolve one call together with its dialing session.
//!
//! # Invariants
//! - Only active when both `dialer_actions` and `dialer_sessions` exist.
//! - Call time is `call_started`, falling back to `created_at`.

use crate::db::DbPool;
use crate::model::detail::{CallDetail, CallSource, RecordDetail};
use crate::model::item::{duration_label, EpochMs, ProviderKind, TimelineItem};
use crate::provider::{
    collect_items, non_blank, FetchRequest, ProviderResult, TimelineProvider,
};
use rusqlite::{params, OptionalExtension, Row};

const BACKING_TYPES: &[&str] = &["dialer_actions", "dialer_sessions"];

const ACTION_COLUMNS: &str = "a.id,
    a.subject,
    a.notes,
    a.phone_number,
    a.call_started,
    a.call_ended,
    a.call_duration,
    a.owner_name,
    a.status,
    a.recording_id,
    s.name AS session_name,
    COALESCE(a.call_started, a.created_at) AS occurred_at";

#[derive(Debug)]
struct ActionRow {
    id: String,
    subject: Option<String>,
    notes: Option<String>,
    phone_number: Option<String>,
    call_started: Option<EpochMs>,
    call_ended: Option<EpochMs>,
    duration: u32,
    owner_name: Option<String>,
    status: Option<String>,
    recording_id: Option<String>,
    session_name: Option<String>,
    occurred_at: EpochMs,
}

impl ActionRow {
    fn decode(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            subject: row.get("subject")?,
            notes: row.get("notes")?,
            phone_number: row.get("phone_number")?,
            call_started: row.get("call_started")?,
            call_ended: row.get("call_ended")?,
            duration: row.get::<_, Option<u32>>("call_duration")?.unwrap_or(0),
            owner_name: row.get("owner_name")?,
            status: row.get("status")?,
            recording_id: row.get("recording_id")?,
            session_name: row.get("session_name")?,
            occurred_at: row.get("occurred_at")?,
        })
    }

    fn to_item(&self) -> TimelineItem {
        TimelineItem::call(ProviderKind::Dialer, &self.id, self.occurred_at, self.duration)
            .with_subject(non_blank(self.subject.clone()))
            .with_body(non_blank(self.notes.clone()))
            .with_phone(non_blank(self.phone_number.clone()))
    }

    fn to_call_detail(&self) -> CallDetail {
        CallDetail {
            source: CallSource::Dialer,
            owner_name: non_blank(self.owner_name.clone()),
            created_by: None,
            status: non_blank(self.status.clone()),
            notes: non_blank(self.notes.clone()),
            phone: non_blank(self.phone_number.clone()),
            recording_id: non_blank(self.recording_id.clone()),
            duration_label: duration_label(self.duration),
            started_at_ms: self.call_started,
            ended_at_ms: self.call_ended,
            session_name: non_blank(self.session_name.clone()),
        }
    }
}

/// Calls logged by the third-party dialer.
pub struct DialerProvider {
    pool: DbPool,
}

impl DialerProvider {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl TimelineProvider for DialerProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Dialer
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
            "SELECT {ACTION_COLUMNS}
             FROM dialer_actions a
             LEFT JOIN dialer_sessions s ON s.id = a.session_id
             WHERE a.identity_id = ?1
               AND (?2 IS NULL OR COALESCE(a.call_started, a.created_at) >= ?2)
               AND (?3 IS NULL OR COALESCE(a.call_started, a.created_at) < ?3)
             ORDER BY occurred_at DESC, a.id ASC;"
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
            ActionRow::decode,
            ActionRow::to_item,
            request,
        )
    }

    fn resolve(&self, record_id: &str) -> ProviderResult<Option<RecordDetail>> {
        let conn = self.pool.get()?;
        let action = conn
            .query_row(
                &format!(
                    "SELECT {ACTION_COLUMNS}
                     FROM dialer_actions a
                     LEFT JOIN dialer_sessions s ON s.id = a.session_id
                     WHERE a.id = ?1;"
                ),
                [record_id],
                ActionRow::decode,
            )
            .optional()?;

        Ok(action.map(|action| RecordDetail {
            call: Some(action.to_call_detail()),
            ..RecordDetail::single(action.to_item())
        }))
    }
}
