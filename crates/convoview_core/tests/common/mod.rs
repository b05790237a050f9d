//! Shared fixtures: a migrated temp-file database with raw SQL seeders.

#![allow(dead_code)]

use convoview_core::db::packages::{install_package, OptionalPackage};
use convoview_core::db::{open_pool, DbPool};
use convoview_core::{ConvoHistoryService, FixedClock, HistoryConfig};
use rusqlite::params;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

pub const MINUTE_MS: i64 = 60 * 1000;
pub const HOUR_MS: i64 = 60 * MINUTE_MS;
pub const DAY_MS: i64 = 24 * HOUR_MS;
/// 2026-10-17 12:00:00 UTC, a Saturday.
pub const NOW: i64 = 1_792_238_400_000;

pub struct Fixture {
    _dir: TempDir,
    pub pool: DbPool,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let pool = open_pool(dir.path().join("convoview.db"), 4).unwrap();
        Self { _dir: dir, pool }
    }

    pub fn with_packages(packages: &[OptionalPackage]) -> Self {
        let fixture = Self::new();
        for package in packages {
            fixture.install(*package);
        }
        fixture
    }

    pub fn install(&self, package: OptionalPackage) {
        install_package(&self.pool.get().unwrap(), package).unwrap();
    }

    pub fn service(&self) -> ConvoHistoryService {
        self.service_with(HistoryConfig::default())
    }

    pub fn service_with(&self, config: HistoryConfig) -> ConvoHistoryService {
        ConvoHistoryService::sqlite(self.pool.clone(), config)
            .unwrap()
            .with_clock(Arc::new(FixedClock(NOW)))
    }

    pub fn execute(&self, sql: &str, params: impl rusqlite::Params) {
        self.pool.get().unwrap().execute(sql, params).unwrap();
    }

    pub fn identity(&self, name: &str, utc_offset_minutes: Option<i32>) -> String {
        let id = new_id();
        self.execute(
            "INSERT INTO identities (id, name, utc_offset_minutes) VALUES (?1, ?2, ?3);",
            params![id, name, utc_offset_minutes],
        );
        id
    }

    pub fn conversation(&self, identity_id: &str, name: &str) -> String {
        let id = new_id();
        self.execute(
            "INSERT INTO conversations (id, identity_id, object_id, name, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![id, identity_id, new_id(), name, NOW - 30 * DAY_MS],
        );
        id
    }

    pub fn email(&self, conversation_id: &str, subject: &str, sent_at: i64) -> String {
        self.email_with(conversation_id, subject, "Hello there", sent_at, true)
    }

    pub fn email_with(
        &self,
        conversation_id: &str,
        subject: &str,
        body: &str,
        sent_at: i64,
        outbound: bool,
    ) -> String {
        let id = new_id();
        self.execute(
            "INSERT INTO email_messages
                (id, conversation_id, subject, text_body, html_body, from_address, to_address,
                 is_outbound, sent_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9);",
            params![
                id,
                conversation_id,
                subject,
                body,
                format!("<p>{body}</p>"),
                if outbound { "rep@acme.test" } else { "lead@prospect.test" },
                if outbound { "lead@prospect.test" } else { "rep@acme.test" },
                outbound,
                sent_at,
            ],
        );
        id
    }

    pub fn call_task(
        &self,
        identity_id: &str,
        subject: &str,
        description: Option<&str>,
        duration_seconds: Option<u32>,
        completed_at: i64,
    ) -> String {
        self.task(
            identity_id,
            subject,
            description,
            "Completed",
            "Call",
            duration_seconds,
            Some(completed_at),
        )
    }

    /// Completed call task whose negative duration fails to decode.
    pub fn undecodable_call_task(&self, identity_id: &str, completed_at: i64) -> String {
        let id = new_id();
        self.execute(
            "INSERT INTO tasks
                (id, identity_id, subject, status, task_subtype, call_duration_seconds,
                 completed_at, created_at)
             VALUES (?1, ?2, 'Broken call', 'Completed', 'Call', -5, ?3, ?3);",
            params![id, identity_id, completed_at],
        );
        id
    }

    #[allow(clippy::too_many_arguments)]
    pub fn task(
        &self,
        identity_id: &str,
        subject: &str,
        description: Option<&str>,
        status: &str,
        subtype: &str,
        duration_seconds: Option<u32>,
        completed_at: Option<i64>,
    ) -> String {
        let id = new_id();
        self.execute(
            "INSERT INTO tasks
                (id, identity_id, subject, description, status, task_subtype,
                 call_duration_seconds, owner_name, created_by, completed_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'Dana Owner', 'Sam Creator', ?8, ?9);",
            params![
                id,
                identity_id,
                subject,
                description,
                status,
                subtype,
                duration_seconds,
                completed_at,
                NOW - 60 * DAY_MS,
            ],
        );
        id
    }

    pub fn step(&self, identity_id: &str, step_name: &str, status: &str, completed_at: Option<i64>) -> String {
        let id = new_id();
        self.execute(
            "INSERT INTO step_logs
                (id, identity_id, step_name, step_number, cadence_name, status, outcome,
                 instructions, due_at, completed_at, created_at)
             VALUES (?1, ?2, ?3, 2, 'Q4 Outbound', ?4, 'Left a voicemail', 'Call before noon',
                     ?5, ?6, ?7);",
            params![
                id,
                identity_id,
                step_name,
                status,
                NOW - 2 * DAY_MS,
                completed_at,
                NOW - 60 * DAY_MS,
            ],
        );
        id
    }

    pub fn dialer_session(&self, name: &str) -> String {
        let id = new_id();
        self.execute(
            "INSERT INTO dialer_sessions (id, name, session_length_seconds) VALUES (?1, ?2, 3600);",
            params![id, name],
        );
        id
    }

    pub fn dialer_call(
        &self,
        identity_id: &str,
        session_id: Option<&str>,
        phone: &str,
        started_at: i64,
        duration_seconds: u32,
    ) -> String {
        let id = new_id();
        self.execute(
            "INSERT INTO dialer_actions
                (id, identity_id, session_id, subject, notes, phone_number, call_started,
                 call_ended, call_duration, owner_name, status, recording_id, created_at)
             VALUES (?1, ?2, ?3, 'Power dial', 'Asked for pricing', ?4, ?5, ?6, ?7,
                     'Dana Owner', 'Connected', 'rec-42', ?5);",
            params![
                id,
                identity_id,
                session_id,
                phone,
                started_at,
                started_at + i64::from(duration_seconds) * 1000,
                duration_seconds,
            ],
        );
        id
    }

    pub fn sms(&self, identity_id: &str, text: &str, outbound: bool, sent_at: i64) -> String {
        let id = new_id();
        self.execute(
            "INSERT INTO sms_messages
                (id, identity_id, message_text, to_number, sender_number, is_outbound, sent_at,
                 created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7);",
            params![
                id,
                identity_id,
                text,
                if outbound { "5550100199" } else { "5550100000" },
                if outbound { "5550100000" } else { "5550100199" },
                outbound,
                sent_at,
            ],
        );
        id
    }
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
