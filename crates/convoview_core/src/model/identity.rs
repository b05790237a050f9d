//! Identity whose history is being assembled.

use serde::Serialize;

/// One contact/lead as seen by the history service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub name: String,
    /// Offset used for identity-local calendar boundaries. `None` falls back
    /// to the configured default.
    pub utc_offset_minutes: Option<i32>,
}
