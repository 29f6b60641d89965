//! Server configuration from environment variables.
//!
//! # Responsibility
//! - Resolve bind address, store path and logging settings with defaults.
//! - Report bad values as `ConfigError` instead of panicking.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

pub const PORT_VAR: &str = "STUDYHUB_PORT";
pub const BIND_VAR: &str = "STUDYHUB_BIND";
pub const DB_PATH_VAR: &str = "STUDYHUB_DB_PATH";
pub const LOG_LEVEL_VAR: &str = "STUDYHUB_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "STUDYHUB_LOG_DIR";

const DEFAULT_PORT: u16 = 5000;
const DB_FILE_NAME: &str = "studyhub.sqlite3";
const LOG_DIR_NAME: &str = "studyhub-logs";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value `{value}` for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind: IpAddr,
    pub port: u16,
    pub db_path: PathBuf,
    pub log_level: String,
    pub log_dir: PathBuf,
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = parse_or(PORT_VAR, var(PORT_VAR), DEFAULT_PORT)?;
        let bind = parse_or(BIND_VAR, var(BIND_VAR), IpAddr::V4(Ipv4Addr::UNSPECIFIED))?;
        let db_path = var(DB_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DB_FILE_NAME));
        let log_level = var(LOG_LEVEL_VAR)
            .unwrap_or_else(|| studyhub_core::default_log_level().to_string());

        let log_dir = var(LOG_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(LOG_DIR_NAME));
        if !log_dir.is_absolute() {
            return Err(ConfigError::Invalid {
                key: LOG_DIR_VAR,
                value: log_dir.display().to_string(),
                reason: "must be an absolute path".to_string(),
            });
        }

        Ok(Self {
            bind,
            port,
            db_path,
            log_level,
            log_dir,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|err: T::Err| ConfigError::Invalid {
            key,
            reason: err.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, ConfigError, DB_PATH_VAR, LOG_DIR_VAR, PORT_VAR};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 5000);
        assert!(config.db_path.ends_with("studyhub.sqlite3"));
        assert!(config.log_dir.is_absolute());
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:5000");
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = load(&[(PORT_VAR, " 8081 "), (DB_PATH_VAR, "/data/habits.db")]).unwrap();
        assert_eq!(config.port, 8081);
        assert_eq!(config.db_path, PathBuf::from("/data/habits.db"));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = load(&[(PORT_VAR, "   ")]).unwrap();
        assert_eq!(config.port, 5000);
    }

    #[test]
    fn bad_port_is_reported() {
        let err = load(&[(PORT_VAR, "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key, .. } if key == PORT_VAR));
    }

    #[test]
    fn relative_log_dir_is_rejected() {
        let err = load(&[(LOG_DIR_VAR, "logs")]).unwrap_err();
        assert!(err.to_string().contains(LOG_DIR_VAR));
    }
}
