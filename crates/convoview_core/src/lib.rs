//! Core of convoview: one merged, filterable, paginated activity timeline
//! per contact, assembled from independently stored sources.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod provider;
pub mod registry;
pub mod service;
pub mod timeline;

pub use config::{ConfigError, HistoryConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::detail::{CallDetail, CallSource, DetailEntry, RecordDetail, StepDetail};
pub use model::item::{EpochMs, ItemKind, ItemValidationError, ProviderKind, TimelineItem};
pub use provider::{FetchRequest, ProviderError, ProviderResult, TimelineProvider};
pub use registry::{CapabilityCatalog, SourceRegistry, StaticCatalog};
pub use service::{Clock, ConvoHistoryService, FixedClock, HistoryError, HistoryQuery, SystemClock};
pub use timeline::group::GroupedHistory;

/// Minimal health-check API for embedding layers.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
