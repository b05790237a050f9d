//! SQLite storage for the reference source stores.
//!
//! The schema has two tiers. Core tables (identities, conversations, email,
//! tasks, step logs) are created by versioned migrations on every open.
//! Package tables (dialer, sms) are never migrated in: they appear only when
//! `packages::install_package` runs, and their presence is exactly what the
//! capability catalog probes to activate the matching providers.
//!
//! # Invariants
//! - Core schema version lives in `PRAGMA user_version`; package installs do
//!   not bump it, so a database stays openable with or without packages.
//! - Providers only see pooled connections that already passed migration.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;
pub mod packages;

pub use open::{open_db, open_db_in_memory, open_pool, DbPool, PooledConnection};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    Pool(r2d2::Error),
    /// The database was migrated by a newer build than this one.
    SchemaTooNew { found: u32, supported: u32 },
    /// A package schema failed to apply.
    PackageInstall {
        package: &'static str,
        source: rusqlite::Error,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Pool(err) => write!(f, "connection pool error: {err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "core schema version {found} is newer than supported {supported}"
            ),
            Self::PackageInstall { package, source } => {
                write!(f, "installing package `{package}` failed: {source}")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::PackageInstall { source: err, .. } => Some(err),
            Self::Pool(err) => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<r2d2::Error> for DbError {
    fn from(value: r2d2::Error) -> Self {
        Self::Pool(value)
    }
}
