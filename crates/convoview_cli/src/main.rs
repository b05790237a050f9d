//! `convoview` command line entry point.
//!
//! # Responsibility
//! - Query grouped history or record detail from a database file as JSON.
//! - Install optional package schemas and seed a demo identity.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use convoview_core::db::packages::{install_package, OptionalPackage};
use convoview_core::db::{open_pool, DbPool};
use convoview_core::registry::SqliteCatalog;
use convoview_core::{
    default_log_level, init_logging, CapabilityCatalog, Clock, ConvoHistoryService, HistoryConfig,
    HistoryQuery, SystemClock,
};
use rusqlite::params;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use uuid::Uuid;

const HOUR_MS: i64 = 60 * 60 * 1000;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Unified conversation history over a convoview database
#[derive(Parser)]
#[command(name = "convoview", version, about)]
struct Cli {
    /// SQLite database file
    #[arg(long, env = "CONVOVIEW_DB_PATH", default_value = "convoview.sqlite3")]
    db: PathBuf,

    /// JSON file with history settings; environment overrides are used when absent
    #[arg(long)]
    config: Option<PathBuf>,

    /// Absolute directory for rolling log files; logging is off when absent
    #[arg(long, env = "CONVOVIEW_LOG_DIR")]
    log_dir: Option<String>,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print one page of an identity's grouped history
    History {
        /// Identity whose history is listed
        identity: String,
        #[arg(long, default_value = "20")]
        size: i64,
        #[arg(long, default_value = "0")]
        offset: i64,
        /// All, Email, Call, SMS or Custom
        #[arg(long = "type", default_value = "All")]
        type_filter: String,
        /// All, Today, Yesterday, This Week, Last Week, This Month, Last Month or Custom
        #[arg(long = "date", default_value = "All")]
        date_filter: String,
        /// Case-insensitive text matched against subject, body, phone and email
        #[arg(long)]
        search: Option<String>,
        /// Custom date range, YYYY-MM-DD..YYYY-MM-DD
        #[arg(long)]
        range: Option<String>,
    },
    /// Print the enriched detail of one record
    Detail {
        record_id: String,
        /// Email, Call, SMS or Custom
        #[arg(long, default_value = "Email")]
        kind: String,
    },
    /// Install an optional package schema (dialer or sms)
    InstallPackage { package: String },
    /// Insert a demo identity with activity in every active source
    SeedDemo {
        #[arg(long, default_value = "Demo Lead")]
        name: String,
    },
    /// Check core linkage
    Ping,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("event=cli_exit module=cli status=error error={err}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir).context("logging setup failed")?;
    }

    if let Command::Ping = cli.command {
        println!("convoview_core ping={}", convoview_core::ping());
        println!("convoview_core version={}", convoview_core::core_version());
        return Ok(());
    }

    let config = load_config(cli.config.as_deref())?;
    let pool = open_pool(&cli.db, config.pool_size)
        .with_context(|| format!("cannot open database `{}`", cli.db.display()))?;

    match cli.command {
        Command::History {
            identity,
            size,
            offset,
            type_filter,
            date_filter,
            search,
            range,
        } => {
            let query = HistoryQuery {
                page_size: size,
                page_offset: offset,
                identity_id: identity,
                type_filter,
                date_filter,
                search_term: search,
                extra_filter: range,
            };
            let groups = service(pool, config)?.get_convo_history(&query)?;
            println!("{}", serde_json::to_string_pretty(&groups)?);
        }
        Command::Detail { record_id, kind } => {
            let detail = service(pool, config)?.get_record_info(&record_id, &kind)?;
            println!("{}", serde_json::to_string_pretty(&detail)?);
        }
        Command::InstallPackage { package } => {
            let Some(package) = OptionalPackage::parse(&package) else {
                bail!("unknown package `{package}`; expected dialer or sms");
            };
            install_package(&*pool.get()?, package)?;
            println!("installed package {}", package.as_str());
        }
        Command::SeedDemo { name } => {
            let identity_id = seed_demo(&pool, &name, SystemClock.now_ms())?;
            println!("{identity_id}");
        }
        Command::Ping => {}
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<HistoryConfig> {
    let Some(path) = path else {
        return Ok(HistoryConfig::from_env()?);
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read config `{}`", path.display()))?;
    let config: HistoryConfig = serde_json::from_str(&raw)
        .with_context(|| format!("invalid config `{}`", path.display()))?;
    config.validate()?;
    Ok(config)
}

fn service(pool: DbPool, config: HistoryConfig) -> anyhow::Result<ConvoHistoryService> {
    Ok(ConvoHistoryService::sqlite(pool, config)?)
}

/// Seeds one identity with a thread, a call, a completed step and, when the
/// packages are installed, a dialer call and a text message.
fn seed_demo(pool: &DbPool, name: &str, now_ms: i64) -> anyhow::Result<String> {
    let catalog = SqliteCatalog::new(pool.clone());
    let with_dialer =
        catalog.is_registered("dialer_actions")? && catalog.is_registered("dialer_sessions")?;
    let with_sms = catalog.is_registered("sms_messages")?;

    let mut conn = pool.get()?;
    let tx = conn.transaction()?;
    let identity_id = new_id();
    tx.execute(
        "INSERT INTO identities (id, name, created_at) VALUES (?1, ?2, ?3);",
        params![identity_id, name, now_ms],
    )?;

    let thread_id = new_id();
    tx.execute(
        "INSERT INTO conversations (id, identity_id, object_id, name, created_at)
         VALUES (?1, ?2, ?3, 'Introduction', ?4);",
        params![thread_id, identity_id, new_id(), now_ms - 9 * DAY_MS],
    )?;
    for (subject, outbound, age) in [
        ("Quick introduction", true, 9 * DAY_MS),
        ("Re: Quick introduction", false, 8 * DAY_MS),
        ("Pricing overview", true, 2 * HOUR_MS),
    ] {
        tx.execute(
            "INSERT INTO email_messages
                (id, conversation_id, subject, text_body, from_address, to_address,
                 is_outbound, sent_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8);",
            params![
                new_id(),
                thread_id,
                subject,
                format!("{subject} body"),
                if outbound { "rep@example.com" } else { "lead@example.com" },
                if outbound { "lead@example.com" } else { "rep@example.com" },
                outbound,
                now_ms - age,
            ],
        )?;
    }

    tx.execute(
        "INSERT INTO tasks
            (id, identity_id, subject, description, status, task_subtype,
             call_duration_seconds, owner_name, created_by, completed_at, created_at)
         VALUES (?1, ?2, 'Discovery call', 'Phone: (555) 010-0199', 'Completed', 'Call',
                 320, 'Demo Rep', 'Demo Rep', ?3, ?3);",
        params![new_id(), identity_id, now_ms - DAY_MS],
    )?;
    tx.execute(
        "INSERT INTO step_logs
            (id, identity_id, step_name, step_number, cadence_name, status, outcome,
             instructions, completed_at, created_at)
         VALUES (?1, ?2, 'LinkedIn touch', 3, 'Demo cadence', 'Completed', 'Connected',
                 'Send a connection request', ?3, ?3);",
        params![new_id(), identity_id, now_ms - 3 * DAY_MS],
    )?;

    if with_dialer {
        let session_id = new_id();
        tx.execute(
            "INSERT INTO dialer_sessions (id, name, session_length_seconds)
             VALUES (?1, 'Demo power hour', 3600);",
            params![session_id],
        )?;
        tx.execute(
            "INSERT INTO dialer_actions
                (id, identity_id, session_id, subject, phone_number, call_started, call_ended,
                 call_duration, owner_name, status, created_at)
             VALUES (?1, ?2, ?3, 'Follow-up dial', '5550100199', ?4, ?5, 95, 'Demo Rep',
                     'Connected', ?4);",
            params![
                new_id(),
                identity_id,
                session_id,
                now_ms - 5 * HOUR_MS,
                now_ms - 5 * HOUR_MS + 95_000,
            ],
        )?;
    }
    if with_sms {
        tx.execute(
            "INSERT INTO sms_messages
                (id, identity_id, message_text, to_number, sender_number, is_outbound, sent_at,
                 created_at)
             VALUES (?1, ?2, 'Thanks for the call!', '5550100199', '5550100000', 1, ?3, ?3);",
            params![new_id(), identity_id, now_ms - HOUR_MS],
        )?;
    }

    tx.commit()?;
    log::info!(
        "event=seed_demo module=cli status=ok identity_id={identity_id} dialer={with_dialer} sms={with_sms}"
    );
    Ok(identity_id)
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::{load_config, seed_demo, Cli};
    use clap::Parser;
    use convoview_core::db::open_pool;
    use convoview_core::db::packages::{install_package, OptionalPackage};
    use convoview_core::{ConvoHistoryService, FixedClock, HistoryConfig, HistoryQuery};
    use std::sync::Arc;

    const NOW: i64 = 1_792_238_400_000;

    #[test]
    fn parses_history_flags() {
        let cli = Cli::try_parse_from([
            "convoview",
            "--db",
            "/tmp/x.db",
            "history",
            "lead-1",
            "--type",
            "SMS",
            "--date",
            "Custom",
            "--range",
            "2026-10-01..2026-10-15",
        ])
        .expect("valid arguments");
        assert_eq!(cli.db.to_str(), Some("/tmp/x.db"));
        assert!(matches!(
            cli.command,
            super::Command::History { ref type_filter, ref range, size: 20, .. }
                if type_filter == "SMS" && range.as_deref() == Some("2026-10-01..2026-10-15")
        ));
    }

    #[test]
    fn loads_partial_json_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"max_page_size": 30, "concurrent_fetch": false}"#)
            .expect("write config");
        let config = load_config(Some(&path)).expect("valid config");
        assert_eq!(config.max_page_size, 30);
        assert!(!config.concurrent_fetch);

        std::fs::write(&path, r#"{"pool_size": 0}"#).expect("write config");
        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn seeded_demo_shows_up_in_every_source() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pool = open_pool(dir.path().join("demo.db"), 2).expect("pool");
        {
            let conn = pool.get().expect("connection");
            install_package(&conn, OptionalPackage::Dialer).expect("dialer");
            install_package(&conn, OptionalPackage::Sms).expect("sms");
        }

        let identity_id = seed_demo(&pool, "Demo Lead", NOW).expect("seed");
        let service = ConvoHistoryService::sqlite(pool, HistoryConfig::default())
            .expect("service")
            .with_clock(Arc::new(FixedClock(NOW)));
        let groups = service
            .get_convo_history(&HistoryQuery::new(identity_id, 50))
            .expect("history");
        assert_eq!(groups.values().map(Vec::len).sum::<usize>(), 7);
    }
}
