//! Configuration module for the Lean Coffee backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::models::StageLabels;
use crate::refresh::RefreshSettings;
use crate::session::budget::{validate_max_votes, DEFAULT_MAX_VOTES};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// How often live sessions reload their board; `None` disables polling
    pub refresh_interval: Option<Duration>,
    /// Vote budget given to newly joined sessions
    pub default_max_votes: u32,
    /// Idle time after which a session is dropped; `None` keeps sessions forever
    pub session_ttl: Option<Duration>,
    /// Labels the three stages are persisted under
    pub stage_labels: StageLabels,
}

/// A malformed configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(pub String);

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid configuration: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let db_path = env::var("LEAN_COFFEE_DB_PATH")
            .unwrap_or_else(|_| "./data/lean-coffee.sqlite".to_string())
            .into();

        let bind_addr = env::var("LEAN_COFFEE_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| ConfigError(format!("LEAN_COFFEE_BIND_ADDR: {}", e)))?;

        let log_level = env::var("LEAN_COFFEE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let refresh_ms = parse_var("LEAN_COFFEE_REFRESH_INTERVAL_MS", 5000u64)?;
        let refresh_interval = (refresh_ms > 0).then(|| Duration::from_millis(refresh_ms));

        let default_max_votes = parse_var("LEAN_COFFEE_DEFAULT_MAX_VOTES", DEFAULT_MAX_VOTES)?;
        validate_max_votes(default_max_votes)
            .map_err(|e| ConfigError(format!("LEAN_COFFEE_DEFAULT_MAX_VOTES: {}", e.message())))?;

        let ttl_secs = parse_var("LEAN_COFFEE_SESSION_TTL_SECS", 3600u64)?;
        let session_ttl = (ttl_secs > 0).then(|| Duration::from_secs(ttl_secs));

        let stage_labels = match env::var("LEAN_COFFEE_STAGE_LABELS") {
            Ok(raw) => StageLabels::parse(&raw).ok_or_else(|| {
                ConfigError(
                    "LEAN_COFFEE_STAGE_LABELS must be three distinct comma separated labels"
                        .to_string(),
                )
            })?,
            Err(_) => StageLabels::default(),
        };

        Ok(Self {
            db_path,
            bind_addr,
            log_level,
            refresh_interval,
            default_max_votes,
            session_ttl,
            stage_labels,
        })
    }

    pub fn refresh_settings(&self) -> RefreshSettings {
        RefreshSettings {
            interval: self.refresh_interval,
            session_ttl: self.session_ttl,
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ConfigError(format!("{}: {}", name, e))),
        Err(_) => Ok(default),
    }
}
