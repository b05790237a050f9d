//! Record detail shapes returned by single-record resolution.
//!
//! # Responsibility
//! - Carry the normalized record plus the richer, kind-specific metadata the
//!   list view leaves out.
//!
//! # Invariants
//! - `DetailEntry::item_type` is always the lower-cased kind name.
//! - `conversation` is set only for Email records, `call` only for Call
//!   records and `step` only for Custom records.

use crate::model::conversation::ConversationThread;
use crate::model::item::{EpochMs, ItemKind, TimelineItem};
use serde::Serialize;

/// Enriched single-record view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDetail {
    pub record: TimelineItem,
    /// Entries shown in the detail body: the whole thread for emails, the
    /// message history for SMS, the record itself otherwise.
    pub items: Vec<DetailEntry>,
    pub conversation: Option<ConversationThread>,
    pub call: Option<CallDetail>,
    pub step: Option<StepDetail>,
}

impl RecordDetail {
    /// Detail whose body is just the record itself.
    pub fn single(record: TimelineItem) -> Self {
        Self {
            items: vec![DetailEntry::from_item(&record)],
            record,
            conversation: None,
            call: None,
            step: None,
        }
    }

    pub fn kind(&self) -> ItemKind {
        self.record.kind
    }
}

/// One entry of a detail body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailEntry {
    pub item_type: String,
    pub source_id: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub html_body: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub is_outbound: Option<bool>,
    pub occurred_at_ms: EpochMs,
}

impl DetailEntry {
    pub fn from_item(item: &TimelineItem) -> Self {
        Self {
            item_type: item.kind.item_type().to_string(),
            source_id: item.source_id.clone(),
            subject: item.subject.clone(),
            body: item.body.clone(),
            html_body: None,
            from: item.email.clone().or_else(|| item.phone.clone()),
            to: None,
            is_outbound: None,
            occurred_at_ms: item.occurred_at_ms,
        }
    }
}

/// Where a call record lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallSource {
    Task,
    Dialer,
}

/// Call-specific metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallDetail {
    pub source: CallSource,
    pub owner_name: Option<String>,
    pub created_by: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub phone: Option<String>,
    pub recording_id: Option<String>,
    pub duration_label: String,
    pub started_at_ms: Option<EpochMs>,
    pub ended_at_ms: Option<EpochMs>,
    pub session_name: Option<String>,
}

impl CallDetail {
    /// Whether the call came from the third-party dialer package.
    pub fn is_enterprise(&self) -> bool {
        self.source == CallSource::Dialer
    }
}

/// Outreach-step metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDetail {
    pub step_name: String,
    pub step_number: i64,
    pub cadence_name: Option<String>,
    pub status: String,
    pub outcome: Option<String>,
    pub instructions: Option<String>,
    pub due_at_ms: Option<EpochMs>,
}
