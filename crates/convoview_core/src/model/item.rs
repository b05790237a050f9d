//! Timeline item model.
//!
//! # Responsibility
//! - Define `ItemKind`/`ProviderKind` and the `TimelineItem` record.
//! - Derive display hints (`icon`, `is_email`, `duration_label`) from kind
//!   and duration instead of storing them.
//!
//! # Invariants
//! - `conversation_id` is `Some` only for `ItemKind::Email`.
//! - `duration_seconds` is `Some` only for `ItemKind::Call`.
//! - Items are immutable snapshots once a provider has normalized them.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Epoch milliseconds, the timestamp unit used across the core.
pub type EpochMs = i64;

/// Kind of activity shown on the timeline.
///
/// Declaration order doubles as the tie-break order when two items share a
/// timestamp.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ItemKind {
    Email,
    Call,
    #[serde(rename = "SMS")]
    Sms,
    Custom,
}

pub const ICON_EMAIL: &str = "standard:email";
pub const ICON_CALL: &str = "standard:call";
pub const ICON_SMS: &str = "standard:sms";
pub const ICON_CUSTOM: &str = "standard:task";

impl ItemKind {
    pub const ALL: [ItemKind; 4] = [Self::Email, Self::Call, Self::Sms, Self::Custom];

    /// Display/filter name (`Email`, `Call`, `SMS`, `Custom`).
    pub fn label(self) -> &'static str {
        match self {
            Self::Email => "Email",
            Self::Call => "Call",
            Self::Sms => "SMS",
            Self::Custom => "Custom",
        }
    }

    /// Lower-cased kind used by detail entries.
    pub fn item_type(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Call => "call",
            Self::Sms => "sms",
            Self::Custom => "custom",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Email => ICON_EMAIL,
            Self::Call => ICON_CALL,
            Self::Sms => ICON_SMS,
            Self::Custom => ICON_CUSTOM,
        }
    }

    /// Case-insensitive parse of a kind name.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(normalized))
    }
}

impl Display for ItemKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Source a timeline item was fetched from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Conversation threads and their email messages.
    Conversation,
    /// Completed call-type tasks.
    Activity,
    /// Outreach step log entries.
    StepLog,
    /// Optional third-party dialer call log.
    Dialer,
    /// Optional third-party text messaging.
    Sms,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 5] = [
        Self::Conversation,
        Self::Activity,
        Self::StepLog,
        Self::Dialer,
        Self::Sms,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Conversation => "conversation",
            Self::Activity => "activity",
            Self::StepLog => "step_log",
            Self::Dialer => "dialer",
            Self::Sms => "sms",
        }
    }

    /// The one item kind this provider produces.
    pub fn item_kind(self) -> ItemKind {
        match self {
            Self::Conversation => ItemKind::Email,
            Self::Activity | Self::Dialer => ItemKind::Call,
            Self::StepLog => ItemKind::Custom,
            Self::Sms => ItemKind::Sms,
        }
    }
}

impl Display for ProviderKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Common normalized representation of one activity event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineItem {
    pub kind: ItemKind,
    pub provider: ProviderKind,
    pub subject: Option<String>,
    pub body: Option<String>,
    /// Primary sort key.
    pub occurred_at_ms: EpochMs,
    /// Id of the originating record; `None` for synthetic items.
    pub source_id: Option<String>,
    /// Meaningful only when `kind == ItemKind::Call`.
    pub duration_seconds: Option<u32>,
    /// Counterpart phone number, when the source records one.
    pub phone: Option<String>,
    /// Counterpart email address, when the source records one.
    pub email: Option<String>,
    /// Meaningful only when `kind == ItemKind::Email`.
    pub conversation_id: Option<String>,
}

impl TimelineItem {
    fn base(provider: ProviderKind, occurred_at_ms: EpochMs) -> Self {
        Self {
            kind: provider.item_kind(),
            provider,
            subject: None,
            body: None,
            occurred_at_ms,
            source_id: None,
            duration_seconds: None,
            phone: None,
            email: None,
            conversation_id: None,
        }
    }

    /// Email message that belongs to a conversation thread.
    pub fn email(
        source_id: impl Into<String>,
        conversation_id: impl Into<String>,
        occurred_at_ms: EpochMs,
    ) -> Self {
        Self {
            source_id: Some(source_id.into()),
            conversation_id: Some(conversation_id.into()),
            ..Self::base(ProviderKind::Conversation, occurred_at_ms)
        }
    }

    /// Logged call from either the task store or the dialer package.
    pub fn call(
        provider: ProviderKind,
        source_id: impl Into<String>,
        occurred_at_ms: EpochMs,
        duration_seconds: u32,
    ) -> Self {
        Self {
            source_id: Some(source_id.into()),
            duration_seconds: Some(duration_seconds),
            ..Self::base(provider, occurred_at_ms)
        }
    }

    /// Text message from the SMS package.
    pub fn sms(source_id: impl Into<String>, occurred_at_ms: EpochMs) -> Self {
        Self {
            source_id: Some(source_id.into()),
            ..Self::base(ProviderKind::Sms, occurred_at_ms)
        }
    }

    /// Outreach step entry. `source_id` may be absent for synthetic entries.
    pub fn custom(source_id: Option<String>, occurred_at_ms: EpochMs) -> Self {
        Self {
            source_id,
            ..Self::base(ProviderKind::StepLog, occurred_at_ms)
        }
    }

    pub fn with_subject(mut self, subject: Option<String>) -> Self {
        self.subject = subject;
        self
    }

    pub fn with_body(mut self, body: Option<String>) -> Self {
        self.body = body;
        self
    }

    pub fn with_phone(mut self, phone: Option<String>) -> Self {
        self.phone = phone;
        self
    }

    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }

    pub fn is_email(&self) -> bool {
        self.kind == ItemKind::Email
    }

    pub fn icon(&self) -> &'static str {
        self.kind.icon()
    }

    /// Human duration for call items, `None` for every other kind.
    pub fn duration_label(&self) -> Option<String> {
        self.duration_seconds.map(duration_label)
    }

    /// Checks the kind-specific field invariants.
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        if self.kind != self.provider.item_kind() {
            return Err(ItemValidationError::ProviderKindMismatch {
                kind: self.kind,
                provider: self.provider,
            });
        }
        if self.conversation_id.is_some() && self.kind != ItemKind::Email {
            return Err(ItemValidationError::ConversationOnNonEmail(self.kind));
        }
        if self.duration_seconds.is_some() && self.kind != ItemKind::Call {
            return Err(ItemValidationError::DurationOnNonCall(self.kind));
        }
        Ok(())
    }
}

impl Serialize for TimelineItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TimelineItem", 13)?;
        state.serialize_field("type", &self.kind)?;
        state.serialize_field("provider", &self.provider)?;
        state.serialize_field("subject", &self.subject)?;
        state.serialize_field("body", &self.body)?;
        state.serialize_field("occurredAt", &self.occurred_at_ms)?;
        state.serialize_field("sourceId", &self.source_id)?;
        state.serialize_field("duration", &self.duration_seconds)?;
        state.serialize_field("durationLabel", &self.duration_label())?;
        state.serialize_field("phone", &self.phone)?;
        state.serialize_field("email", &self.email)?;
        state.serialize_field("conversationId", &self.conversation_id)?;
        state.serialize_field("isEmail", &self.is_email())?;
        state.serialize_field("icon", self.icon())?;
        state.end()
    }
}

/// Item invariant violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValidationError {
    ProviderKindMismatch { kind: ItemKind, provider: ProviderKind },
    ConversationOnNonEmail(ItemKind),
    DurationOnNonCall(ItemKind),
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProviderKindMismatch { kind, provider } => {
                write!(f, "provider `{provider}` cannot produce `{kind}` items")
            }
            Self::ConversationOnNonEmail(kind) => {
                write!(f, "conversation_id is only valid for Email items, got `{kind}`")
            }
            Self::DurationOnNonCall(kind) => {
                write!(f, "duration is only valid for Call items, got `{kind}`")
            }
        }
    }
}

impl Error for ItemValidationError {}

/// Renders a call duration, e.g. `60` -> `"60 seconds"`, `90` ->
/// `"1 minute 30 seconds"`, `3600` -> `"1 hour"`.
pub fn duration_label(seconds: u32) -> String {
    if seconds <= 60 {
        return plural(seconds, "second");
    }
    if seconds < 3600 {
        let (minutes, rest) = (seconds / 60, seconds % 60);
        return join_units(plural(minutes, "minute"), rest, "second");
    }
    let (hours, minutes) = (seconds / 3600, (seconds % 3600) / 60);
    join_units(plural(hours, "hour"), minutes, "minute")
}

fn join_units(head: String, rest: u32, unit: &str) -> String {
    if rest == 0 {
        head
    } else {
        format!("{head} {}", plural(rest, unit))
    }
}

fn plural(value: u32, unit: &str) -> String {
    if value == 1 {
        format!("1 {unit}")
    } else {
        format!("{value} {unit}s")
    }
}
