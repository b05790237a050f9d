//! SMS package provider.
//!
//! # Responsibility
//! - List text messages exchanged with the identity.
//! - Resolve one message together with the identity's full SMS history.
//!
//! # Invariants
//! - `phone` is the counterpart number: recipient when outbound, sender
//!   when inbound.

use crate::db::DbPool;
use crate::model::detail::{DetailEntry, RecordDetail};
use crate::model::item::{EpochMs, ProviderKind, TimelineItem};
use crate::provider::{
    collect_items, non_blank, query_rows, FetchRequest, ProviderResult, TimelineProvider,
};
use rusqlite::{params, OptionalExtension, Row};

const BACKING_TYPES: &[&str] = &["sms_messages"];

const SMS_COLUMNS: &str = "id,
    identity_id,
    message_text,
    to_number,
    sender_number,
    is_outbound,
    COALESCE(sent_at, created_at) AS occurred_at";

#[derive(Debug)]
struct SmsRow {
    id: String,
    identity_id: String,
    message_text: Option<String>,
    to_number: Option<String>,
    sender_number: Option<String>,
    is_outbound: bool,
    occurred_at: EpochMs,
}

impl SmsRow {
    fn decode(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            identity_id: row.get("identity_id")?,
            message_text: row.get("message_text")?,
            to_number: row.get("to_number")?,
            sender_number: row.get("sender_number")?,
            is_outbound: row.get("is_outbound")?,
            occurred_at: row.get("occurred_at")?,
        })
    }

    fn counterpart(&self) -> Option<String> {
        let number = if self.is_outbound {
            &self.to_number
        } else {
            &self.sender_number
        };
        non_blank(number.clone())
    }

    fn to_item(&self) -> TimelineItem {
        TimelineItem::sms(&self.id, self.occurred_at)
            .with_body(non_blank(self.message_text.clone()))
            .with_phone(self.counterpart())
    }

    fn to_entry(&self) -> DetailEntry {
        DetailEntry {
            from: non_blank(self.sender_number.clone()),
            to: non_blank(self.to_number.clone()),
            is_outbound: Some(self.is_outbound),
            ..DetailEntry::from_item(&self.to_item())
        }
    }
}

pub struct SmsProvider {
    pool: DbPool,
}

impl SmsProvider {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl TimelineProvider for SmsProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Sms
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
            "SELECT {SMS_COLUMNS}
             FROM sms_messages
             WHERE identity_id = ?1
               AND (?2 IS NULL OR COALESCE(sent_at, created_at) >= ?2)
               AND (?3 IS NULL OR COALESCE(sent_at, created_at) < ?3)
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
            SmsRow::decode,
            SmsRow::to_item,
            request,
        )
    }

    fn resolve(&self, record_id: &str) -> ProviderResult<Option<RecordDetail>> {
        let conn = self.pool.get()?;
        let message = conn
            .query_row(
                &format!("SELECT {SMS_COLUMNS} FROM sms_messages WHERE id = ?1;"),
                [record_id],
                SmsRow::decode,
            )
            .optional()?;
        let Some(message) = message else {
            return Ok(None);
        };

        let history = query_rows(
            &conn,
            self.kind(),
            &format!(
                "SELECT {SMS_COLUMNS}
                 FROM sms_messages
                 WHERE identity_id = ?1
                 ORDER BY occurred_at ASC, id ASC;"
            ),
            [&message.identity_id],
            SmsRow::decode,
        )?;

        Ok(Some(RecordDetail {
            items: history.iter().map(SmsRow::to_entry).collect(),
            ..RecordDetail::single(message.to_item())
        }))
    }
}
