//! Optional third-party package schemas.
//!
//! A package is installed into an existing database after the fact, the way
//! a managed add-on lands in a host environment. The capability catalog
//! decides provider activation purely from whether these tables exist.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

/// Installable third-party package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionalPackage {
    /// Call-logging dialer (`dialer_sessions`, `dialer_actions`).
    Dialer,
    /// Text-messaging system (`sms_messages`).
    Sms,
}

impl OptionalPackage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dialer => "dialer",
            Self::Sms => "sms",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dialer" => Some(Self::Dialer),
            "sms" => Some(Self::Sms),
            _ => None,
        }
    }

    fn schema_sql(self) -> &'static str {
        match self {
            Self::Dialer => include_str!("dialer.sql"),
            Self::Sms => include_str!("sms.sql"),
        }
    }
}

/// Installs one package schema. Re-installing is a no-op.
pub fn install_package(conn: &Connection, package: OptionalPackage) -> DbResult<()> {
    conn.execute_batch(package.schema_sql())
        .map_err(|source| DbError::PackageInstall {
            package: package.as_str(),
            source,
        })?;
    info!(
        "event=package_install module=db status=ok package={}",
        package.as_str()
    );
    Ok(())
}
