//! Normalized domain model shared by every timeline source.
//!
//! # Responsibility
//! - Define the common item shape every provider normalizes into.
//! - Define the thread and detail shapes returned by record resolution.
//!
//! # Invariants
//! - `TimelineItem::is_email()` and `TimelineItem::icon()` are pure functions
//!   of `kind` and are never stored.
//! - Only `Email` items carry a `conversation_id`.

pub mod conversation;
pub mod detail;
pub mod identity;
pub mod item;
