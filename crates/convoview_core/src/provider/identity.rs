//! Identity lookup.

use crate::db::DbPool;
use crate::model::identity::Identity;
use crate::provider::ProviderResult;
use rusqlite::OptionalExtension;

/// Resolves identity ids to the records the history service needs.
pub trait IdentityDirectory: Send + Sync {
    fn find_identity(&self, identity_id: &str) -> ProviderResult<Option<Identity>>;
}

/// `identities` table lookup.
pub struct SqliteIdentityDirectory {
    pool: DbPool,
}

impl SqliteIdentityDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl IdentityDirectory for SqliteIdentityDirectory {
    fn find_identity(&self, identity_id: &str) -> ProviderResult<Option<Identity>> {
        let conn = self.pool.get()?;
        let identity = conn
            .query_row(
                "SELECT id, name, utc_offset_minutes FROM identities WHERE id = ?1;",
                [identity_id],
                |row| {
                    Ok(Identity {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        utc_offset_minutes: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(identity)
    }
}
