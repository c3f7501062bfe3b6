//! Server configuration module.
//!
//! Parses configuration from environment variables for the Listkeeper server.
//!
//! # Environment Variables
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `PORT` | No | 8080 | HTTP server port |
//! | `LISTKEEPER_SESSION_TTL_SECS` | No | 86400 | Idle seconds before a session expires |
//! | `LISTKEEPER_MAX_SESSIONS` | No | 10000 | Maximum number of live sessions |
//! | `LISTKEEPER_CLEANUP_INTERVAL_SECS` | No | 60 | Seconds between expired-session sweeps |

use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::session::{SessionStoreConfig, DEFAULT_MAX_CAPACITY, DEFAULT_TTL_SECS};

/// Default HTTP server port.
const DEFAULT_PORT: u16 = 8080;

/// Default interval between expired-session sweeps.
const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 60;

const ENV_PORT: &str = "PORT";
const ENV_SESSION_TTL: &str = "LISTKEEPER_SESSION_TTL_SECS";
const ENV_MAX_SESSIONS: &str = "LISTKEEPER_MAX_SESSIONS";
const ENV_CLEANUP_INTERVAL: &str = "LISTKEEPER_CLEANUP_INTERVAL_SECS";

/// Errors that can occur when parsing configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Environment variable has invalid format.
    #[error("invalid format for {var}: {message}")]
    InvalidFormat { var: String, message: String },
}

/// Server configuration parsed from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// HTTP server port.
    pub port: u16,

    /// Idle time after which a session expires.
    pub session_ttl: Duration,

    /// Maximum number of live sessions.
    pub max_sessions: usize,

    /// Interval between expired-session sweeps.
    pub cleanup_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            session_ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            max_sessions: DEFAULT_MAX_CAPACITY,
            cleanup_interval: Duration::from_secs(DEFAULT_CLEANUP_INTERVAL_SECS),
        }
    }
}

impl Config {
    /// Parse configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidFormat` if a variable is set but is not
    /// a number, contains invalid unicode, or is zero where zero makes no
    /// sense.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use listkeeper_server::config::Config;
    ///
    /// let config = Config::from_env().expect("Failed to load config");
    /// println!("Server will listen on port {}", config.port);
    /// ```
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = parse_env(ENV_PORT)?.unwrap_or(defaults.port);
        let session_ttl = parse_nonzero::<u64>(ENV_SESSION_TTL)?
            .map(Duration::from_secs)
            .unwrap_or(defaults.session_ttl);
        let max_sessions = parse_nonzero::<usize>(ENV_MAX_SESSIONS)?.unwrap_or(defaults.max_sessions);
        let cleanup_interval = parse_nonzero::<u64>(ENV_CLEANUP_INTERVAL)?
            .map(Duration::from_secs)
            .unwrap_or(defaults.cleanup_interval);

        Ok(Self {
            port,
            session_ttl,
            max_sessions,
            cleanup_interval,
        })
    }

    /// Settings for the session store.
    pub fn session_store_config(&self) -> SessionStoreConfig {
        SessionStoreConfig::new(self.max_sessions, self.session_ttl)
    }
}

/// Parse an optional environment variable.
///
/// Returns `Ok(None)` if the variable is not set.
fn parse_env<T>(var: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|err: T::Err| ConfigError::InvalidFormat {
                var: var.to_string(),
                message: err.to_string(),
            }),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidFormat {
            var: var.to_string(),
            message: "contains invalid unicode".to_string(),
        }),
    }
}

/// Parse an optional environment variable that must be greater than zero.
fn parse_nonzero<T>(var: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr + PartialEq + Default,
    T::Err: std::fmt::Display,
{
    match parse_env::<T>(var)? {
        Some(value) if value == T::default() => Err(ConfigError::InvalidFormat {
            var: var.to_string(),
            message: "must be greater than zero".to_string(),
        }),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    /// Helper to temporarily set environment variables for testing.
    struct EnvGuard {
        vars: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new() -> Self {
            Self { vars: Vec::new() }
        }

        fn set(&mut self, key: &str, value: &str) {
            let old_value = env::var(key).ok();
            self.vars.push((key.to_string(), old_value));
            env::set_var(key, value);
        }

        fn remove(&mut self, key: &str) {
            let old_value = env::var(key).ok();
            self.vars.push((key.to_string(), old_value));
            env::remove_var(key);
        }

        fn clear_all(&mut self) {
            for key in [ENV_PORT, ENV_SESSION_TTL, ENV_MAX_SESSIONS, ENV_CLEANUP_INTERVAL] {
                self.remove(key);
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in self.vars.iter().rev() {
                match value {
                    Some(v) => env::set_var(key, v),
                    None => env::remove_var(key),
                }
            }
        }
    }

    #[test]
    #[serial]
    fn test_config_defaults() {
        let mut guard = EnvGuard::new();
        guard.clear_all();

        let config = Config::from_env().expect("should parse config");
        assert_eq!(config, Config::default());
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.session_ttl, Duration::from_secs(86_400));
        assert_eq!(config.max_sessions, 10_000);
    }

    #[test]
    #[serial]
    fn test_config_custom_values() {
        let mut guard = EnvGuard::new();
        guard.clear_all();
        guard.set(ENV_PORT, "9090");
        guard.set(ENV_SESSION_TTL, "600");
        guard.set(ENV_MAX_SESSIONS, " 25 ");
        guard.set(ENV_CLEANUP_INTERVAL, "5");

        let config = Config::from_env().expect("should parse config");
        assert_eq!(config.port, 9090);
        assert_eq!(config.session_ttl, Duration::from_secs(600));
        assert_eq!(config.max_sessions, 25);
        assert_eq!(config.cleanup_interval, Duration::from_secs(5));
    }

    #[test]
    #[serial]
    fn test_parse_port_invalid() {
        let mut guard = EnvGuard::new();
        guard.clear_all();
        guard.set(ENV_PORT, "not-a-number");

        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFormat { ref var, .. } if var == "PORT"));
    }

    #[test]
    #[serial]
    fn test_parse_port_out_of_range() {
        let mut guard = EnvGuard::new();
        guard.clear_all();
        guard.set(ENV_PORT, "99999");

        assert!(Config::from_env().is_err());
    }

    #[test]
    #[serial]
    fn test_zero_ttl_rejected() {
        let mut guard = EnvGuard::new();
        guard.clear_all();
        guard.set(ENV_SESSION_TTL, "0");

        let err = Config::from_env().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid format for LISTKEEPER_SESSION_TTL_SECS: must be greater than zero"
        );
    }

    #[test]
    #[serial]
    fn test_zero_max_sessions_rejected() {
        let mut guard = EnvGuard::new();
        guard.clear_all();
        guard.set(ENV_MAX_SESSIONS, "0");

        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_session_store_config_mirrors_config() {
        let config = Config {
            port: 1,
            session_ttl: Duration::from_secs(30),
            max_sessions: 7,
            cleanup_interval: Duration::from_secs(1),
        };

        let store_config = config.session_store_config();
        assert_eq!(store_config.max_capacity, 7);
        assert_eq!(store_config.ttl, Duration::from_secs(30));
    }
}
