//! Conversation/email provider.
//!
//! # Responsibility
//! - List email messages from every conversation thread the identity owns.
//! - Resolve one message together with its whole thread for detail display.
//!
//! # Invariants
//! - Every item carries the id of its owning thread in `conversation_id`.
//! - A message timestamp is `sent_at`, falling back to `created_at`.
//! - `email` is the counterpart address: recipient for outbound mail,
//!   sender for inbound mail.

use crate::db::DbPool;
use crate::model::conversation::ConversationThread;
use crate::model::detail::{DetailEntry, RecordDetail};
use crate::model::item::{EpochMs, ProviderKind, TimelineItem};
use crate::provider::{
    collect_items, non_blank, query_rows, FetchRequest, ProviderResult, TimelineProvider,
};
use log::debug;
use rusqlite::{params, OptionalExtension, Row};

const BACKING_TYPES: &[&str] = &["conversations", "email_messages"];

const MESSAGE_COLUMNS: &str = "m.id,
    m.conversation_id,
    m.subject,
    m.text_body,
    m.html_body,
    m.from_address,
    m.to_address,
    m.is_outbound,
    COALESCE(m.sent_at, m.created_at) AS occurred_at";

#[derive(Debug)]
struct MessageRow {
    id: String,
    conversation_id: String,
    subject: Option<String>,
    text_body: Option<String>,
    html_body: Option<String>,
    from_address: Option<String>,
    to_address: Option<String>,
    is_outbound: bool,
    occurred_at: EpochMs,
}

impl MessageRow {
    fn decode(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            conversation_id: row.get("conversation_id")?,
            subject: row.get("subject")?,
            text_body: row.get("text_body")?,
            html_body: row.get("html_body")?,
            from_address: row.get("from_address")?,
            to_address: row.get("to_address")?,
            is_outbound: row.get("is_outbound")?,
            occurred_at: row.get("occurred_at")?,
        })
    }

    fn counterpart(&self) -> Option<String> {
        let address = if self.is_outbound {
            &self.to_address
        } else {
            &self.from_address
        };
        non_blank(address.clone())
    }

    fn to_item(&self) -> TimelineItem {
        TimelineItem::email(&self.id, &self.conversation_id, self.occurred_at)
            .with_subject(non_blank(self.subject.clone()))
            .with_body(non_blank(self.text_body.clone()))
            .with_email(self.counterpart())
    }

    fn to_entry(&self) -> DetailEntry {
        DetailEntry {
            html_body: non_blank(self.html_body.clone()),
            from: non_blank(self.from_address.clone()),
            to: non_blank(self.to_address.clone()),
            is_outbound: Some(self.is_outbound),
            ..DetailEntry::from_item(&self.to_item())
        }
    }
}

/// Email messages grouped in conversation threads.
pub struct ConversationProvider {
    pool: DbPool,
}

impl ConversationProvider {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl TimelineProvider for ConversationProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Conversation
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
            "SELECT {MESSAGE_COLUMNS}
             FROM email_messages m
             JOIN conversations c ON c.id = m.conversation_id
             WHERE c.identity_id = ?1
               AND (?2 IS NULL OR COALESCE(m.sent_at, m.created_at) >= ?2)
               AND (?3 IS NULL OR COALESCE(m.sent_at, m.created_at) < ?3)
             ORDER BY occurred_at DESC, m.id ASC;"
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
            MessageRow::decode,
            MessageRow::to_item,
            request,
        )
    }

    fn resolve(&self, record_id: &str) -> ProviderResult<Option<RecordDetail>> {
        let conn = self.pool.get()?;
        let message = conn
            .query_row(
                &format!("SELECT {MESSAGE_COLUMNS} FROM email_messages m WHERE m.id = ?1;"),
                [record_id],
                MessageRow::decode,
            )
            .optional()?;
        let Some(message) = message else {
            debug!("event=record_detail module=provider status=miss provider=conversation");
            return Ok(None);
        };

        let thread = conn.query_row(
            "SELECT id, identity_id, object_id, name, cadence_member_id, created_at
             FROM conversations
             WHERE id = ?1;",
            [&message.conversation_id],
            |row| {
                Ok(ConversationThread {
                    id: row.get("id")?,
                    identity_id: row.get("identity_id")?,
                    object_id: row.get("object_id")?,
                    name: row.get("name")?,
                    cadence_member_id: row.get("cadence_member_id")?,
                    created_at_ms: row.get("created_at")?,
                    items: Vec::new(),
                })
            },
        )
        .optional()?;

        let thread_rows = query_rows(
            &conn,
            self.kind(),
            &format!(
                "SELECT {MESSAGE_COLUMNS}
                 FROM email_messages m
                 WHERE m.conversation_id = ?1
                 ORDER BY occurred_at ASC, m.id ASC;"
            ),
            [&message.conversation_id],
            MessageRow::decode,
        )?;

        Ok(Some(RecordDetail {
            record: message.to_item(),
            items: thread_rows.iter().map(MessageRow::to_entry).collect(),
            conversation: thread.map(|thread| ConversationThread {
                items: thread_rows.iter().map(MessageRow::to_item).collect(),
                ..thread
            }),
            call: None,
            step: None,
        }))
    }
}
