use convoview_core::db::migrations::latest_version;
use convoview_core::db::packages::{install_package, OptionalPackage};
use convoview_core::db::{open_db, open_db_in_memory, open_pool, DbError};
use convoview_core::registry::SqliteCatalog;
use convoview_core::CapabilityCatalog;
use rusqlite::Connection;

#[test]
fn in_memory_database_gets_core_schema_only() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in ["identities", "conversations", "email_messages", "tasks", "step_logs"] {
        assert!(table_exists(&conn, table), "table {table} does not exist");
    }
    for table in ["dialer_actions", "dialer_sessions", "sms_messages"] {
        assert!(!table_exists(&conn, table), "package table {table} created by migrations");
    }
}

#[test]
fn reopening_a_database_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("convoview.db");

    let first = open_db(&path).unwrap();
    assert_eq!(schema_version(&first), latest_version());
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(schema_version(&second), latest_version());
    assert!(table_exists(&second, "email_messages"));
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::SchemaTooNew { found, supported } => {
            assert_eq!(found, 999);
            assert_eq!(supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(open_pool(&path, 2).is_err());
}

#[test]
fn package_install_is_idempotent_and_visible_to_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let pool = open_pool(dir.path().join("convoview.db"), 2).unwrap();
    let catalog = SqliteCatalog::new(pool.clone());

    assert!(catalog.is_registered("tasks").unwrap());
    assert!(!catalog.is_registered("sms_messages").unwrap());

    let conn = pool.get().unwrap();
    install_package(&conn, OptionalPackage::Sms).unwrap();
    install_package(&conn, OptionalPackage::Sms).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    drop(conn);

    assert!(catalog.is_registered("sms_messages").unwrap());
    assert!(!catalog.is_registered("dialer_actions").unwrap());
    assert_eq!(OptionalPackage::parse(" Dialer "), Some(OptionalPackage::Dialer));
    assert_eq!(OptionalPackage::parse("fax"), None);
}

#[test]
fn pooled_connections_enforce_foreign_keys() {
    let dir = tempfile::tempdir().unwrap();
    let pool = open_pool(dir.path().join("convoview.db"), 2).unwrap();
    let conn = pool.get().unwrap();

    let orphan = conn.execute(
        "INSERT INTO email_messages (id, conversation_id, created_at) VALUES ('m1', 'missing', 0);",
        [],
    );
    assert!(orphan.is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn table_exists(conn: &Connection, table_name: &str) -> bool {
    conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table_name],
        |row| row.get(0),
    )
    .unwrap()
}

#[test]
fn failed_package_install_names_the_package() {
    let conn = open_db_in_memory().unwrap();
    conn.pragma_update(None, "query_only", true).unwrap();

    match install_package(&conn, OptionalPackage::Dialer).unwrap_err() {
        DbError::PackageInstall { package, .. } => assert_eq!(package, "dialer"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!table_exists(&conn, "dialer_actions"));
}
