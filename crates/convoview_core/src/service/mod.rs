//! Use-case services.
//!
//! # Responsibility
//! - Expose the two read operations of the core: grouped history and
//!   single-record detail.
//!
//! # Invariants
//! - Services depend on provider, catalog and identity traits only.
//! - Every request is independent; services hold no per-request state.

pub mod clock;
pub mod history_service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use history_service::{sqlite_registry, ConvoHistoryService, HistoryError, HistoryQuery};
