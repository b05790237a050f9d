//! Conversation thread read model.
//!
//! # Invariants
//! - A thread belongs to exactly one identity and one underlying object.
//! - `items` are Email items ordered oldest first.
//! - The aggregator only reads threads; it never creates or mutates them.

use crate::model::item::{EpochMs, TimelineItem};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationThread {
    pub id: String,
    pub identity_id: String,
    /// Business object the thread is attached to.
    pub object_id: String,
    pub name: String,
    pub cadence_member_id: Option<String>,
    pub created_at_ms: EpochMs,
    pub items: Vec<TimelineItem>,
}

impl ConversationThread {
    pub fn total_emails(&self) -> usize {
        self.items.len()
    }

    /// Most recent message, if any.
    pub fn latest(&self) -> Option<&TimelineItem> {
        self.items.last()
    }
}
