//! Service configuration from environment variables.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::services::sessions::{DEFAULT_IDLE_TTL, DEFAULT_MAX_SESSIONS};

/// Default remote replication timeout in seconds.
pub const DEFAULT_SYNC_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    /// Remote copy of the deck. Replication is off when unset.
    pub remote_sync_url: Option<String>,
    pub remote_sync_timeout: Duration,
    /// Study sessions unused for this long are dropped.
    pub session_idle_ttl: Duration,
    pub max_sessions: usize,
}

impl Config {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORT",
                value: raw,
            })?,
            None => 3000,
        };

        let database_path = lookup("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path);

        let remote_sync_url = lookup("REMOTE_SYNC_URL")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        let timeout_secs = positive(&lookup, "REMOTE_SYNC_TIMEOUT_SECS")?
            .unwrap_or(DEFAULT_SYNC_TIMEOUT_SECS);
        let idle_ttl = positive(&lookup, "SESSION_IDLE_TTL_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_IDLE_TTL);
        let max_sessions = match positive(&lookup, "MAX_SESSIONS")? {
            Some(n) => usize::try_from(n).unwrap_or(usize::MAX),
            None => DEFAULT_MAX_SESSIONS,
        };

        Ok(Self {
            host,
            port,
            database_path,
            remote_sync_url,
            remote_sync_timeout: Duration::from_secs(timeout_secs),
            session_idle_ttl: idle_ttl,
            max_sessions,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Optional whole number greater than zero.
fn positive<F>(lookup: &F, key: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|n| *n > 0)
            .map(Some)
            .ok_or(ConfigError::InvalidValue { key, value: raw }),
        None => Ok(None),
    }
}

fn default_database_path() -> PathBuf {
    // Use app data directory for production, fallback to current dir
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vocab-trainer")
        .join("vocab.db")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert!(config.database_path.ends_with("vocab-trainer/vocab.db"));
        assert_eq!(config.remote_sync_url, None);
        assert_eq!(config.remote_sync_timeout, Duration::from_secs(10));
        assert_eq!(config.session_idle_ttl, Duration::from_secs(7200));
        assert_eq!(config.max_sessions, 256);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("DATABASE_PATH", "/tmp/test.db"),
            ("REMOTE_SYNC_URL", "https://sheets.example.com/deck"),
            ("REMOTE_SYNC_TIMEOUT_SECS", "3"),
            ("SESSION_IDLE_TTL_SECS", "600"),
            ("MAX_SESSIONS", "16"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.database_path, PathBuf::from("/tmp/test.db"));
        assert_eq!(
            config.remote_sync_url.as_deref(),
            Some("https://sheets.example.com/deck")
        );
        assert_eq!(config.remote_sync_timeout, Duration::from_secs(3));
        assert_eq!(config.session_idle_ttl, Duration::from_secs(600));
        assert_eq!(config.max_sessions, 16);
    }

    #[test]
    fn test_blank_remote_url_disables_sync() {
        let config = load(&[("REMOTE_SYNC_URL", "   ")]).unwrap();
        assert_eq!(config.remote_sync_url, None);
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(
            load(&[("PORT", "eighty")]),
            Err(ConfigError::InvalidValue {
                key: "PORT",
                value: "eighty".to_string()
            })
        );
        assert!(load(&[("REMOTE_SYNC_TIMEOUT_SECS", "0")]).is_err());
        assert!(load(&[("SESSION_IDLE_TTL_SECS", "soon")]).is_err());
        assert!(load(&[("MAX_SESSIONS", "0")]).is_err());
    }
}
