//! Capability catalogs answer "is this data type installed here?".

use crate::db::{DbError, DbPool};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Catalog probe failure.
#[derive(Debug)]
pub enum CatalogError {
    Db(DbError),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "catalog probe failed: {err}"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
        }
    }
}

impl From<DbError> for CatalogError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for CatalogError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<r2d2::Error> for CatalogError {
    fn from(value: r2d2::Error) -> Self {
        Self::Db(DbError::Pool(value))
    }
}

/// Environment metadata lookup used to detect optional sources.
pub trait CapabilityCatalog: Send + Sync {
    fn is_registered(&self, type_name: &str) -> Result<bool, CatalogError>;
}

/// Treats every SQLite table as a registered type.
pub struct SqliteCatalog {
    pool: DbPool,
}

impl SqliteCatalog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl CapabilityCatalog for SqliteCatalog {
    fn is_registered(&self, type_name: &str) -> Result<bool, CatalogError> {
        let conn = self.pool.get()?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
             );",
            [type_name],
            |row| row.get(0),
        )?;
        Ok(exists)
    }
}

/// Fixed set of type names.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    types: BTreeSet<String>,
}

impl StaticCatalog {
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            types: types.into_iter().map(Into::into).collect(),
        }
    }

    pub fn insert(&mut self, type_name: impl Into<String>) {
        self.types.insert(type_name.into());
    }
}

impl CapabilityCatalog for StaticCatalog {
    fn is_registered(&self, type_name: &str) -> Result<bool, CatalogError> {
        Ok(self.types.contains(type_name))
    }
}

#[cfg(test)]
mod tests {
    use super::{CapabilityCatalog, StaticCatalog};

    #[test]
    fn static_catalog_matches_exact_names() {
        let mut catalog = StaticCatalog::new(["tasks", "step_logs"]);
        assert!(catalog.is_registered("tasks").expect("probe"));
        assert!(!catalog.is_registered("Tasks").expect("probe"));
        assert!(!catalog.is_registered("sms_messages").expect("probe"));

        catalog.insert("sms_messages");
        assert!(catalog.is_registered("sms_messages").expect("probe"));
    }
}
