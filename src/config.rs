//! Configuration for the MySQL MCP server
//!
//! All settings come from environment variables so the server can be
//! spawned directly by an MCP host without a config file.

use serde::{Deserialize, Serialize};

/// Server configuration: connection settings plus fixed limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub limits: Limits,
}

/// MySQL connection settings
///
/// Environment variables and defaults:
/// - `MYSQL_HOST` (127.0.0.1)
/// - `MYSQL_PORT` (3306)
/// - `MYSQL_USER` (root)
/// - `MYSQL_PASSWORD` (empty)
/// - `MYSQL_DATABASE` (empty)
/// - `MYSQL_POOL_SIZE` (10)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default)]
    pub password: String,

    #[serde(default)]
    pub database: String,

    /// Maximum number of pooled connections. Requests beyond this queue
    /// on acquisition; the pool is the only backpressure mechanism.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

/// Fixed limits applied to incoming statements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Limits {
    /// Maximum statement length in characters, enforced by the guard
    #[serde(default = "default_max_query_length")]
    pub max_query_length: usize,

    /// Declared result-row cap. Carried in configuration and logged, but
    /// NOT enforced on driver calls.
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,

    /// Declared per-statement timeout in milliseconds. Declarative only,
    /// NOT wired to any enforcement path.
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3306
}

fn default_user() -> String {
    "root".to_string()
}

fn default_pool_size() -> u32 {
    10
}

fn default_max_query_length() -> usize {
    4096
}

fn default_max_rows() -> usize {
    1000
}

fn default_query_timeout_ms() -> u64 {
    30000
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: default_user(),
            password: String::new(),
            database: String::new(),
            pool_size: default_pool_size(),
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_query_length: default_max_query_length(),
            max_rows: default_max_rows(),
            query_timeout_ms: default_query_timeout_ms(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            limits: Limits::default(),
        }
    }
}

impl Config {
    /// Load configuration from process environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// Malformed numeric values fall back to the default with a warning;
    /// a bad optional variable must not prevent startup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Config::default();

        if let Some(host) = lookup("MYSQL_HOST") {
            config.connection.host = host;
        }
        if let Some(port) = lookup("MYSQL_PORT") {
            match port.parse::<u16>() {
                Ok(port) => config.connection.port = port,
                Err(e) => {
                    tracing::warn!("Invalid MYSQL_PORT '{}': {}. Using default {}.", port, e, config.connection.port);
                }
            }
        }
        if let Some(user) = lookup("MYSQL_USER") {
            config.connection.user = user;
        }
        if let Some(password) = lookup("MYSQL_PASSWORD") {
            config.connection.password = password;
        }
        if let Some(database) = lookup("MYSQL_DATABASE") {
            config.connection.database = database;
        }
        if let Some(size) = lookup("MYSQL_POOL_SIZE") {
            match size.parse::<u32>() {
                Ok(size) if size > 0 => config.connection.pool_size = size,
                Ok(_) => {
                    tracing::warn!("MYSQL_POOL_SIZE must be at least 1. Using default {}.", config.connection.pool_size);
                }
                Err(e) => {
                    tracing::warn!("Invalid MYSQL_POOL_SIZE '{}': {}. Using default {}.", size, e, config.connection.pool_size);
                }
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.connection.host, "127.0.0.1");
        assert_eq!(config.connection.port, 3306);
        assert_eq!(config.connection.user, "root");
        assert_eq!(config.connection.password, "");
        assert_eq!(config.connection.database, "");
        assert_eq!(config.connection.pool_size, 10);
        assert_eq!(config.limits.max_query_length, 4096);
        assert_eq!(config.limits.max_rows, 1000);
        assert_eq!(config.limits.query_timeout_ms, 30000);
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("MYSQL_HOST", "db.internal"),
            ("MYSQL_PORT", "3307"),
            ("MYSQL_USER", "app"),
            ("MYSQL_PASSWORD", "secret"),
            ("MYSQL_DATABASE", "inventory"),
            ("MYSQL_POOL_SIZE", "4"),
        ]));
        assert_eq!(config.connection.host, "db.internal");
        assert_eq!(config.connection.port, 3307);
        assert_eq!(config.connection.user, "app");
        assert_eq!(config.connection.password, "secret");
        assert_eq!(config.connection.database, "inventory");
        assert_eq!(config.connection.pool_size, 4);
    }

    #[test]
    fn test_malformed_port_falls_back() {
        let config = Config::from_lookup(lookup_from(&[("MYSQL_PORT", "not-a-port")]));
        assert_eq!(config.connection.port, 3306);
    }

    #[test]
    fn test_zero_pool_size_falls_back() {
        let config = Config::from_lookup(lookup_from(&[("MYSQL_POOL_SIZE", "0")]));
        assert_eq!(config.connection.pool_size, 10);
    }
}
