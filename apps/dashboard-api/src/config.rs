//! Dashboard API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable                   | Default      |
//! |----------------------------|--------------|
//! | `SANJ_DB_PATH`             | `./sanj.db`  |
//! | `SANJ_BIND_ADDR`           | `0.0.0.0`    |
//! | `SANJ_PORT`                | `8080`       |
//! | `SANJ_MAX_CONNECTIONS`     | `5`          |
//! | `SANJ_LOW_STOCK_THRESHOLD` | `10`         |
//! | `SANJ_EXPIRY_WINDOW_DAYS`  | `90`         |
//! | `SANJ_PAGE_SIZE`           | `10`         |

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sanj_core::{
    DEFAULT_EXPIRY_WINDOW_DAYS, DEFAULT_LOW_STOCK_THRESHOLD, DEFAULT_PAGE_SIZE, MAX_EXPIRY_WINDOW_DAYS, MAX_PAGE_SIZE,
};
use sanj_db::DbConfig;

/// Dashboard API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// SQLite database file
    pub db_path: PathBuf,

    /// Interface to bind
    pub bind_addr: IpAddr,

    /// HTTP port
    pub port: u16,

    /// Pool size
    pub max_connections: u32,

    /// Products at or below this many units are "low stock"
    pub low_stock_threshold: i64,

    /// Days ahead that count as "expiring soon"
    pub expiry_window_days: i64,

    /// Finance table page size when the request gives none
    pub page_size: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            db_path: PathBuf::from("./sanj.db"),
            bind_addr: IpAddr::from([0, 0, 0, 0]),
            port: 8080,
            max_connections: 5,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            expiry_window_days: DEFAULT_EXPIRY_WINDOW_DAYS,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = ApiConfig::default();

        let config = ApiConfig {
            db_path: lookup("SANJ_DB_PATH").map(PathBuf::from).unwrap_or(defaults.db_path),
            bind_addr: parse_or(&lookup, "SANJ_BIND_ADDR", defaults.bind_addr)?,
            port: parse_or(&lookup, "SANJ_PORT", defaults.port)?,
            max_connections: parse_or(&lookup, "SANJ_MAX_CONNECTIONS", defaults.max_connections)?,
            low_stock_threshold: parse_or(&lookup, "SANJ_LOW_STOCK_THRESHOLD", defaults.low_stock_threshold)?,
            expiry_window_days: parse_or(&lookup, "SANJ_EXPIRY_WINDOW_DAYS", defaults.expiry_window_days)?,
            page_size: parse_or(&lookup, "SANJ_PAGE_SIZE", defaults.page_size)?,
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue("SANJ_MAX_CONNECTIONS".to_string()));
        }
        if config.page_size == 0 || config.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidValue("SANJ_PAGE_SIZE".to_string()));
        }
        if config.low_stock_threshold < 0 {
            return Err(ConfigError::InvalidValue("SANJ_LOW_STOCK_THRESHOLD".to_string()));
        }
        if !(0..=MAX_EXPIRY_WINDOW_DAYS).contains(&config.expiry_window_days) {
            return Err(ConfigError::InvalidValue("SANJ_EXPIRY_WINDOW_DAYS".to_string()));
        }

        Ok(config)
    }

    /// Address the HTTP server listens on.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    /// Database settings for this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.db_path).max_connections(self.max_connections)
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        _ => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.db_path, PathBuf::from("./sanj.db"));
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.low_stock_threshold, 10);
        assert_eq!(config.page_size, 10);
    }

    #[test]
    fn test_overrides() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("SANJ_PORT", "9000"),
            ("SANJ_BIND_ADDR", "127.0.0.1"),
            ("SANJ_DB_PATH", "/var/lib/sanj/sanj.db"),
            ("SANJ_LOW_STOCK_THRESHOLD", "25"),
        ]))
        .unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:9000");
        assert_eq!(config.low_stock_threshold, 25);
    }

    #[test]
    fn test_invalid_values() {
        let bad_port = ApiConfig::from_lookup(lookup(&[("SANJ_PORT", "http")]));
        assert!(matches!(bad_port, Err(ConfigError::InvalidValue(key)) if key == "SANJ_PORT"));

        let bad_page = ApiConfig::from_lookup(lookup(&[("SANJ_PAGE_SIZE", "500")]));
        assert!(bad_page.is_err());
    }
}
