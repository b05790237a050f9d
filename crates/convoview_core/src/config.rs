//! History service configuration.
//!
//! # Responsibility
//! - Hold the tunables of history assembly with their defaults.
//! - Overlay `CONVOVIEW_*` environment variables on top of defaults.
//!
//! # Invariants
//! - `max_page_size` and `pool_size` are at least one.
//! - `default_utc_offset_minutes` is within +/- 14 hours.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const ENV_MAX_PAGE_SIZE: &str = "CONVOVIEW_MAX_PAGE_SIZE";
pub const ENV_WEEK_START: &str = "CONVOVIEW_WEEK_START";
pub const ENV_UTC_OFFSET_MINUTES: &str = "CONVOVIEW_UTC_OFFSET_MINUTES";
pub const ENV_CONCURRENT_FETCH: &str = "CONVOVIEW_CONCURRENT_FETCH";
pub const ENV_POOL_SIZE: &str = "CONVOVIEW_POOL_SIZE";
/// Database file used by embedding layers.
pub const ENV_DB_PATH: &str = "CONVOVIEW_DB_PATH";

const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Upper bound applied to caller page sizes.
    pub max_page_size: usize,
    pub week_starts_on: Weekday,
    /// Used for identities without their own offset.
    pub default_utc_offset_minutes: i32,
    /// Query providers on scoped threads instead of one after another.
    pub concurrent_fetch: bool,
    pub pool_size: u32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_page_size: 200,
            week_starts_on: Weekday::Sun,
            default_utc_offset_minutes: 0,
            concurrent_fetch: true,
            pool_size: 4,
        }
    }
}

impl HistoryConfig {
    /// Defaults overlaid with process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().overlay(|key| std::env::var(key).ok())
    }

    /// Overlays values returned by `lookup`; unset keys keep current values.
    pub fn overlay(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let read = |key: &'static str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(value) = read(ENV_MAX_PAGE_SIZE) {
            self.max_page_size = parse_number(ENV_MAX_PAGE_SIZE, &value)?;
        }
        if let Some(value) = read(ENV_WEEK_START) {
            self.week_starts_on = value
                .parse::<Weekday>()
                .map_err(|_| ConfigError::invalid(ENV_WEEK_START, &value, "expected a weekday"))?;
        }
        if let Some(value) = read(ENV_UTC_OFFSET_MINUTES) {
            self.default_utc_offset_minutes = parse_number(ENV_UTC_OFFSET_MINUTES, &value)?;
        }
        if let Some(value) = read(ENV_CONCURRENT_FETCH) {
            self.concurrent_fetch = parse_flag(ENV_CONCURRENT_FETCH, &value)?;
        }
        if let Some(value) = read(ENV_POOL_SIZE) {
            self.pool_size = parse_number(ENV_POOL_SIZE, &value)?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Checks value ranges; used for env overlays and deserialized files.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_page_size == 0 {
            return Err(ConfigError::invalid(
                "max_page_size",
                "0",
                "must be at least 1",
            ));
        }
        if self.pool_size == 0 {
            return Err(ConfigError::invalid("pool_size", "0", "must be at least 1"));
        }
        if self.default_utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(ConfigError::invalid(
                "default_utc_offset_minutes",
                &self.default_utc_offset_minutes.to_string(),
                "must be within +/-840",
            ));
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .parse::<T>()
        .map_err(|_| ConfigError::invalid(key, value, "expected a number"))
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(key, value, "expected true or false")),
    }
}

/// Rejected configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str, reason: &'static str) -> Self {
        Self::InvalidValue {
            key,
            value: value.to_string(),
            reason,
        }
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid `{key}` value `{value}`: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}
