//! In-process provider registry with per-request activation.

use crate::model::item::{ItemKind, ProviderKind};
use crate::provider::TimelineProvider;
use crate::registry::catalog::CapabilityCatalog;
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Provider registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    DuplicateProvider(ProviderKind),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateProvider(kind) => write!(f, "provider already registered: {kind}"),
        }
    }
}

impl Error for RegistryError {}

/// Providers keyed by source kind.
#[derive(Default)]
pub struct SourceRegistry {
    providers: BTreeMap<ProviderKind, Arc<dyn TimelineProvider>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one provider adapter.
    pub fn register(&mut self, provider: Arc<dyn TimelineProvider>) -> Result<(), RegistryError> {
        let kind = provider.kind();
        if self.providers.contains_key(&kind) {
            return Err(RegistryError::DuplicateProvider(kind));
        }
        self.providers.insert(kind, provider);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Providers whose backing types are all registered in `catalog`, in
    /// `ProviderKind` order.
    pub fn active(&self, catalog: &dyn CapabilityCatalog) -> Vec<Arc<dyn TimelineProvider>> {
        self.providers
            .values()
            .filter(|provider| is_active(provider.as_ref(), catalog))
            .cloned()
            .collect()
    }

    /// Active providers that produce `kind` items.
    pub fn active_for(
        &self,
        catalog: &dyn CapabilityCatalog,
        kind: ItemKind,
    ) -> Vec<Arc<dyn TimelineProvider>> {
        self.providers
            .values()
            .filter(|provider| provider.item_kind() == kind)
            .filter(|provider| is_active(provider.as_ref(), catalog))
            .cloned()
            .collect()
    }

    pub fn active_kinds(&self, catalog: &dyn CapabilityCatalog) -> BTreeSet<ProviderKind> {
        self.active(catalog)
            .iter()
            .map(|provider| provider.kind())
            .collect()
    }
}

fn is_active(provider: &dyn TimelineProvider, catalog: &dyn CapabilityCatalog) -> bool {
    let kind = provider.kind();
    for type_name in provider.backing_types() {
        match catalog.is_registered(type_name) {
            Ok(true) => {}
            Ok(false) => {
                debug!(
                    "event=source_probe module=registry status=skip provider={kind} type={type_name} reason=absent"
                );
                return false;
            }
            Err(err) => {
                warn!(
                    "event=source_probe module=registry status=error provider={kind} type={type_name} error={err}"
                );
                return false;
            }
        }
    }
    true
}
