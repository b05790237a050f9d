//! Conversation history use cases.
//!
//! # Responsibility
//! - Resolve the identity, active sources and filters of one request.
//! - Fan out to active providers, merge, paginate and group.
//! - Resolve one record to its enriched detail.
//!
//! # Invariants
//! - One `now` snapshot and one capability probe per request.
//! - A failing or panicking provider never fails its siblings.
//! - Every source failing, or an unknown identity, yields an empty result.
//! - Paging is validated before any source is touched.

use crate::config::HistoryConfig;
use crate::db::DbPool;
use crate::model::detail::RecordDetail;
use crate::model::identity::Identity;
use crate::model::item::{ItemKind, TimelineItem};
use crate::provider::{
    ActivityProvider, ConversationProvider, DialerProvider, FetchRequest, IdentityDirectory,
    SmsProvider, SqliteIdentityDirectory, StepLogProvider, TimelineProvider,
};
use crate::registry::{CapabilityCatalog, RegistryError, SourceRegistry, SqliteCatalog};
use crate::service::clock::{Clock, SystemClock};
use crate::timeline::calendar::CalendarSnapshot;
use crate::timeline::filter::{DateFilter, HistoryFilter, TypeFilter};
use crate::timeline::group::{group_page, GroupedHistory, PageError, PageRequest};
use crate::timeline::merge::merge;
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

/// One history request in the string-typed shape of the external API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub page_size: i64,
    pub page_offset: i64,
    pub identity_id: String,
    pub type_filter: String,
    pub date_filter: String,
    pub search_term: Option<String>,
    /// Custom date range, `YYYY-MM-DD..YYYY-MM-DD`, read with `date_filter = "Custom"`.
    pub extra_filter: Option<String>,
}

impl HistoryQuery {
    /// First page of the unfiltered history of `identity_id`.
    pub fn new(identity_id: impl Into<String>, page_size: i64) -> Self {
        Self {
            page_size,
            page_offset: 0,
            identity_id: identity_id.into(),
            type_filter: "All".to_string(),
            date_filter: "All".to_string(),
            search_term: None,
            extra_filter: None,
        }
    }

    pub fn with_offset(mut self, page_offset: i64) -> Self {
        self.page_offset = page_offset;
        self
    }

    pub fn with_type(mut self, type_filter: impl Into<String>) -> Self {
        self.type_filter = type_filter.into();
        self
    }

    pub fn with_date(mut self, date_filter: impl Into<String>, extra: Option<&str>) -> Self {
        self.date_filter = date_filter.into();
        self.extra_filter = extra.map(str::to_string);
        self
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = Some(term.into());
        self
    }
}

/// Request-level failure surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    InvalidArgument(String),
    InvalidPage(PageError),
    NotFound(String),
    /// Every source that could hold the record failed while looking it up.
    SourceUnavailable(String),
}

impl HistoryError {
    /// Whether the caller sent a request that can never succeed as-is.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_) | Self::InvalidPage(_))
    }
}

impl Display for HistoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::InvalidPage(err) => write!(f, "invalid argument: {err}"),
            Self::NotFound(message) => write!(f, "not found: {message}"),
            Self::SourceUnavailable(message) => write!(f, "source unavailable: {message}"),
        }
    }
}

impl Error for HistoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidPage(err) => Some(err),
            Self::InvalidArgument(_) | Self::NotFound(_) | Self::SourceUnavailable(_) => None,
        }
    }
}

impl From<PageError> for HistoryError {
    fn from(value: PageError) -> Self {
        Self::InvalidPage(value)
    }
}

/// Registry with every SQLite reference adapter registered.
pub fn sqlite_registry(pool: DbPool) -> Result<SourceRegistry, RegistryError> {
    let mut registry = SourceRegistry::new();
    registry.register(Arc::new(ConversationProvider::new(pool.clone())))?;
    registry.register(Arc::new(ActivityProvider::new(pool.clone())))?;
    registry.register(Arc::new(StepLogProvider::new(pool.clone())))?;
    registry.register(Arc::new(DialerProvider::new(pool.clone())))?;
    registry.register(Arc::new(SmsProvider::new(pool)))?;
    Ok(registry)
}

/// Assembles grouped conversation history for one identity at a time.
pub struct ConvoHistoryService {
    registry: SourceRegistry,
    catalog: Arc<dyn CapabilityCatalog>,
    identities: Arc<dyn IdentityDirectory>,
    clock: Arc<dyn Clock>,
    config: HistoryConfig,
}

impl ConvoHistoryService {
    pub fn new(
        registry: SourceRegistry,
        catalog: Arc<dyn CapabilityCatalog>,
        identities: Arc<dyn IdentityDirectory>,
        clock: Arc<dyn Clock>,
        config: HistoryConfig,
    ) -> Self {
        Self {
            registry,
            catalog,
            identities,
            clock,
            config,
        }
    }

    /// Service over one SQLite database using the wall clock.
    pub fn sqlite(pool: DbPool, config: HistoryConfig) -> Result<Self, RegistryError> {
        Ok(Self::new(
            sqlite_registry(pool.clone())?,
            Arc::new(SqliteCatalog::new(pool.clone())),
            Arc::new(SqliteIdentityDirectory::new(pool)),
            Arc::new(SystemClock),
            config,
        ))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns one page of the identity's merged history grouped by
    /// relative date label.
    ///
    /// # Errors
    /// - `InvalidPage` when `page_size <= 0` or `page_offset < 0`.
    pub fn get_convo_history(&self, query: &HistoryQuery) -> Result<GroupedHistory, HistoryError> {
        let started = Instant::now();
        let page = PageRequest::new(query.page_size, query.page_offset, self.config.max_page_size)?;
        let identity_id = query.identity_id.trim();
        info!(
            "event=history_fetch module=service status=start identity_id={} page_size={} page_offset={}",
            identity_id,
            page.size(),
            page.offset()
        );

        let Some(identity) = self.resolve_identity(identity_id) else {
            return Ok(GroupedHistory::new());
        };

        let calendar = CalendarSnapshot::new(
            self.clock.now_ms(),
            identity
                .utc_offset_minutes
                .unwrap_or(self.config.default_utc_offset_minutes),
            self.config.week_starts_on,
        );
        let filter = HistoryFilter::new(
            TypeFilter::parse(&query.type_filter),
            DateFilter::parse(&query.date_filter, query.extra_filter.as_deref()).window(&calendar),
            query.search_term.as_deref(),
        );
        let request = FetchRequest {
            identity_id: identity.id,
            filter,
            limit: Some(page.fetch_limit()),
        };

        let providers = self.registry.active(self.catalog.as_ref());
        if providers.is_empty() {
            info!(
                "event=history_fetch module=service status=ok identity_id={} reason=no_active_sources",
                request.identity_id
            );
            return Ok(GroupedHistory::new());
        }

        let batches = self.fetch_all(&providers, &request);
        let failed = batches.iter().filter(|batch| batch.is_none()).count();
        if failed == providers.len() {
            error!(
                "event=history_fetch module=service status=error identity_id={} reason=all_sources_failed sources={}",
                request.identity_id,
                providers.len()
            );
            return Ok(GroupedHistory::new());
        }

        let merged = merge(batches.into_iter().flatten(), &request.filter);
        let merged_count = merged.len();
        let grouped = group_page(merged, page, &calendar);
        info!(
            "event=history_fetch module=service status=ok identity_id={} sources={} failed={} merged={} groups={} elapsed_ms={}",
            request.identity_id,
            providers.len(),
            failed,
            merged_count,
            grouped.len(),
            started.elapsed().as_millis()
        );
        Ok(grouped)
    }

    /// Re-fetches one record of `kind` with its enrichment.
    ///
    /// # Errors
    /// - `InvalidArgument` for a blank id or an id no active source knows.
    /// - `NotFound` when `kind` is unknown or no active source produces it.
    /// - `SourceUnavailable` when every candidate source failed.
    pub fn get_record_info(&self, record_id: &str, kind: &str) -> Result<RecordDetail, HistoryError> {
        let record_id = record_id.trim();
        if record_id.is_empty() {
            return Err(HistoryError::InvalidArgument(
                "record id cannot be blank".to_string(),
            ));
        }
        let Some(kind) = ItemKind::parse(kind) else {
            return Err(HistoryError::NotFound(format!(
                "unknown record kind `{}`",
                kind.trim()
            )));
        };

        let providers = self.registry.active_for(self.catalog.as_ref(), kind);
        if providers.is_empty() {
            return Err(HistoryError::NotFound(format!(
                "no active source for kind `{kind}`"
            )));
        }

        let mut failed = 0;
        for provider in &providers {
            match provider.resolve(record_id) {
                Ok(Some(detail)) => {
                    info!(
                        "event=record_detail module=service status=ok provider={} record_id={}",
                        provider.kind(),
                        record_id
                    );
                    return Ok(detail);
                }
                Ok(None) => {}
                Err(err) => {
                    failed += 1;
                    warn!(
                        "event=record_detail module=service status=error provider={} record_id={} error={}",
                        provider.kind(),
                        record_id,
                        err
                    );
                }
            }
        }

        if failed == providers.len() {
            error!(
                "event=record_detail module=service status=error kind={kind} record_id={record_id} reason=all_sources_failed"
            );
            return Err(HistoryError::SourceUnavailable(format!(
                "every {kind} source failed to look up `{record_id}`"
            )));
        }

        info!("event=record_detail module=service status=miss kind={kind} record_id={record_id}");
        Err(HistoryError::InvalidArgument(format!(
            "unknown {kind} record `{record_id}`"
        )))
    }

    fn resolve_identity(&self, identity_id: &str) -> Option<Identity> {
        if identity_id.is_empty() {
            info!("event=history_fetch module=service status=skip reason=blank_identity");
            return None;
        }
        match self.identities.find_identity(identity_id) {
            Ok(Some(identity)) => Some(identity),
            Ok(None) => {
                info!(
                    "event=history_fetch module=service status=skip identity_id={identity_id} reason=unknown_identity"
                );
                None
            }
            Err(err) => {
                error!(
                    "event=history_fetch module=service status=error identity_id={identity_id} reason=identity_lookup error={err}"
                );
                None
            }
        }
    }

    /// One batch per provider, `None` for a source that failed.
    fn fetch_all(
        &self,
        providers: &[Arc<dyn TimelineProvider>],
        request: &FetchRequest,
    ) -> Vec<Option<Vec<TimelineItem>>> {
        if !self.config.concurrent_fetch || providers.len() < 2 {
            return providers
                .iter()
                .map(|provider| {
                    let provider = provider.as_ref();
                    catch_unwind(AssertUnwindSafe(|| fetch_one(provider, request)))
                        .unwrap_or_else(|_| {
                            log_panic(provider);
                            None
                        })
                })
                .collect();
        }

        std::thread::scope(|scope| {
            let handles: Vec<_> = providers
                .iter()
                .map(|provider| {
                    let provider = provider.as_ref();
                    (provider, scope.spawn(move || fetch_one(provider, request)))
                })
                .collect();
            handles
                .into_iter()
                .map(|(provider, handle)| {
                    handle.join().unwrap_or_else(|_| {
                        log_panic(provider);
                        None
                    })
                })
                .collect()
        })
    }
}

fn fetch_one(provider: &dyn TimelineProvider, request: &FetchRequest) -> Option<Vec<TimelineItem>> {
    let started = Instant::now();
    match provider.fetch(request) {
        Ok(items) => {
            debug!(
                "event=provider_fetch module=service status=ok provider={} count={} elapsed_ms={}",
                provider.kind(),
                items.len(),
                started.elapsed().as_millis()
            );
            Some(items)
        }
        Err(err) => {
            warn!(
                "event=provider_fetch module=service status=error provider={} elapsed_ms={} error={}",
                provider.kind(),
                started.elapsed().as_millis(),
                err
            );
            None
        }
    }
}

fn log_panic(provider: &dyn TimelineProvider) {
    warn!(
        "event=provider_fetch module=service status=error provider={} reason=panic",
        provider.kind()
    );
}

#[cfg(test)]
mod tests {
    use super::{ConvoHistoryService, HistoryError, HistoryQuery};
    use crate::config::HistoryConfig;
    use crate::model::identity::Identity;
    use crate::provider::{IdentityDirectory, ProviderResult};
    use crate::registry::{SourceRegistry, StaticCatalog};
    use crate::service::clock::FixedClock;
    use crate::timeline::group::PageError;
    use std::sync::Arc;

    struct NoIdentities;

    impl IdentityDirectory for NoIdentities {
        fn find_identity(&self, _identity_id: &str) -> ProviderResult<Option<Identity>> {
            Ok(None)
        }
    }

    fn empty_service() -> ConvoHistoryService {
        ConvoHistoryService::new(
            SourceRegistry::new(),
            Arc::new(StaticCatalog::default()),
            Arc::new(NoIdentities),
            Arc::new(FixedClock(0)),
            HistoryConfig::default(),
        )
    }

    #[test]
    fn rejects_bad_paging_before_lookup() {
        let service = empty_service();
        let zero = service
            .get_convo_history(&HistoryQuery::new("lead-1", 0))
            .expect_err("zero page size is invalid");
        assert_eq!(zero, HistoryError::InvalidPage(PageError::NonPositiveSize(0)));
        assert!(zero.is_invalid_argument());

        let negative = service
            .get_convo_history(&HistoryQuery::new("lead-1", 10).with_offset(-1))
            .expect_err("negative offset is invalid");
        assert_eq!(
            negative,
            HistoryError::InvalidPage(PageError::NegativeOffset(-1))
        );
    }

    #[test]
    fn unknown_identity_is_empty() {
        let grouped = empty_service()
            .get_convo_history(&HistoryQuery::new("missing", 10))
            .expect("unknown identity is not an error");
        assert!(grouped.is_empty());
    }

    #[test]
    fn record_info_argument_errors() {
        let service = empty_service();
        let blank = service
            .get_record_info("  ", "Email")
            .expect_err("blank id is invalid");
        assert!(blank.is_invalid_argument());

        let unknown_kind = service
            .get_record_info("rec-1", "Fax")
            .expect_err("unknown kind");
        assert!(matches!(unknown_kind, HistoryError::NotFound(_)));

        let inactive = service
            .get_record_info("rec-1", "sms")
            .expect_err("no active sms source");
        assert!(matches!(inactive, HistoryError::NotFound(_)));
    }
}
