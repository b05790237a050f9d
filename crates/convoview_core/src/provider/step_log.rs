//! Outreach step-log provider.
//!
//! # Responsibility
//! - Surface completed outreach steps as `Custom` timeline entries.
//!
//! # Invariants
//! - Only completed steps are listed.
//! - Step time is `completed_at`, then `due_at`, then `created_at`.

use crate::db::DbPool;
use crate::model::detail::{RecordDetail, StepDetail};
use crate::model::item::{EpochMs, ProviderKind, TimelineItem};
use crate::provider::{
    collect_items, non_blank, FetchRequest, ProviderResult, TimelineProvider,
};
use rusqlite::{params, OptionalExtension, Row};

const BACKING_TYPES: &[&str] = &["step_logs"];

const STEP_COLUMNS: &str = "id,
    step_name,
    step_number,
    cadence_name,
    status,
    outcome,
    instructions,
    due_at,
    COALESCE(completed_at, due_at, created_at) AS occurred_at";

#[derive(Debug)]
struct StepRow {
    id: String,
    step_name: String,
    step_number: i64,
    cadence_name: Option<String>,
    status: String,
    outcome: Option<String>,
    instructions: Option<String>,
    due_at: Option<EpochMs>,
    occurred_at: EpochMs,
}

impl StepRow {
    fn decode(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            step_name: row.get("step_name")?,
            step_number: row.get("step_number")?,
            cadence_name: row.get("cadence_name")?,
            status: row.get("status")?,
            outcome: row.get("outcome")?,
            instructions: row.get("instructions")?,
            due_at: row.get("due_at")?,
            occurred_at: row.get("occurred_at")?,
        })
    }

    fn to_item(&self) -> TimelineItem {
        let body = non_blank(self.outcome.clone()).or_else(|| non_blank(self.instructions.clone()));
        TimelineItem::custom(Some(self.id.clone()), self.occurred_at)
            .with_subject(non_blank(Some(self.step_name.clone())))
            .with_body(body)
    }
}

pub struct StepLogProvider {
    pool: DbPool,
}

impl StepLogProvider {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl TimelineProvider for StepLogProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::StepLog
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
            "SELECT {STEP_COLUMNS}
             FROM step_logs
             WHERE identity_id = ?1
               AND status = 'Completed'
               AND (?2 IS NULL OR COALESCE(completed_at, due_at, created_at) >= ?2)
               AND (?3 IS NULL OR COALESCE(completed_at, due_at, created_at) < ?3)
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
            StepRow::decode,
            StepRow::to_item,
            request,
        )
    }

    fn resolve(&self, record_id: &str) -> ProviderResult<Option<RecordDetail>> {
        let conn = self.pool.get()?;
        let step = conn
            .query_row(
                &format!("SELECT {STEP_COLUMNS} FROM step_logs WHERE id = ?1;"),
                [record_id],
                StepRow::decode,
            )
            .optional()?;

        Ok(step.map(|step| {
            let detail = StepDetail {
                step_name: step.step_name.clone(),
                step_number: step.step_number,
                cadence_name: non_blank(step.cadence_name.clone()),
                status: step.status.clone(),
                outcome: non_blank(step.outcome.clone()),
                instructions: non_blank(step.instructions.clone()),
                due_at_ms: step.due_at,
            };
            RecordDetail {
                step: Some(detail),
                ..RecordDetail::single(step.to_item())
            }
        }))
    }
}
