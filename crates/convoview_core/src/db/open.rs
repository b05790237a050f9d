//! Connection and pool bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections for single-threaded callers.
//! - Build an r2d2 pool so provider adapters can read concurrently.
//! - Trigger schema migrations before handing out a usable connection.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON` and a busy timeout.
//! - Returned connections (and every pooled connection) see a fully
//!   migrated schema.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Shared read pool handed to SQLite-backed provider adapters.
pub type DbPool = r2d2::Pool<SqliteConnectionManager>;
/// One connection checked out of a [`DbPool`].
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a SQLite database file and applies all pending migrations.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_with("file", || Connection::open(path))
}

/// Opens an in-memory SQLite database and applies all pending migrations.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with("memory", Connection::open_in_memory)
}

/// Migrates the database at `path` and returns a pool of at most `size`
/// connections to it.
///
/// In-memory databases are not supported here: every pooled connection to
/// `:memory:` would see its own empty database.
pub fn open_pool(path: impl AsRef<Path>, size: u32) -> DbResult<DbPool> {
    let path = path.as_ref();
    drop(open_db(path)?);

    let started_at = Instant::now();
    let manager = SqliteConnectionManager::file(path).with_init(configure_connection);
    let pool = r2d2::Pool::builder()
        .max_size(size.max(1))
        .build(manager)
        .map_err(|err| {
            error!(
                "event=db_pool module=db status=error duration_ms={} error_code=pool_build_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            err
        })?;

    info!(
        "event=db_pool module=db status=ok size={} duration_ms={}",
        size.max(1),
        started_at.elapsed().as_millis()
    );
    Ok(pool)
}

fn open_with(
    mode: &'static str,
    opener: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = opener().map_err(|err| {
        error!(
            "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={}",
            started_at.elapsed().as_millis(),
            err
        );
        err
    })?;

    let bootstrapped = configure_connection(&mut conn)
        .map_err(DbError::from)
        .and_then(|()| apply_migrations(&mut conn));
    match bootstrapped {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={mode} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn configure_connection(conn: &mut Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)
}
