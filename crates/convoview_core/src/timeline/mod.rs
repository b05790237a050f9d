//! Cross-source timeline assembly.
//!
//! # Responsibility
//! - Parse caller filters into one `HistoryFilter` shared by every provider.
//! - Merge provider batches into one deterministic order.
//! - Slice the requested page and bucket it into relative date groups.
//!
//! # Invariants
//! - Every date computation in one request uses a single `CalendarSnapshot`.
//! - Nothing here knows how a provider stores its records.

pub mod calendar;
pub mod filter;
pub mod group;
pub mod merge;
