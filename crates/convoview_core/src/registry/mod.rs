//! Capability probing and source selection.
//!
//! # Responsibility
//! - Decide which providers can run against the current environment.
//!
//! # Invariants
//! - Probing is read-only and happens once per request.
//! - A probe failure makes the provider inactive; it never fails a request.

pub mod catalog;
pub mod source_registry;

pub use catalog::{CapabilityCatalog, CatalogError, SqliteCatalog, StaticCatalog};
pub use source_registry::{RegistryError, SourceRegistry};
