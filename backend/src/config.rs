//! Runtime configuration, read from `QRSIM_*` environment variables.

use anyhow::{anyhow, bail, Context, Result};
use axum::http::HeaderValue;
use std::net::SocketAddr;
use std::time::Duration;

use crate::domain::DEFAULT_TICK_INTERVAL;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";
pub const DEFAULT_DATABASE_URL: &str = "sqlite:qr_simulator.db";
pub const DEFAULT_FRONTEND_ORIGIN: &str = "http://localhost:5173";
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Which store backs the services
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Sqlite,
    Memory,
}

impl StorageKind {
    pub fn from_string(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StorageKind::Sqlite),
            "memory" => Ok(StorageKind::Memory),
            other => Err(anyhow!("Unknown storage kind '{}', expected 'sqlite' or 'memory'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub storage: StorageKind,
    pub database_url: String,
    pub tick_interval: Duration,
    pub frontend_origin: HeaderValue,
    /// Default tracing filter; `RUST_LOG` takes precedence when set
    pub log_filter: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup, falling back to
    /// defaults for absent keys
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let bind_addr = get("QRSIM_BIND_ADDR", DEFAULT_BIND_ADDR);
        let bind_addr: SocketAddr = bind_addr
            .parse()
            .with_context(|| format!("Invalid QRSIM_BIND_ADDR: {}", bind_addr))?;

        let storage = StorageKind::from_string(&get("QRSIM_STORAGE", "sqlite"))?;

        let tick_interval = match lookup("QRSIM_TICK_INTERVAL_SECS") {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid QRSIM_TICK_INTERVAL_SECS: {}", raw))?;
                if secs == 0 {
                    bail!("QRSIM_TICK_INTERVAL_SECS must be greater than zero");
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_TICK_INTERVAL,
        };

        let origin = get("QRSIM_FRONTEND_ORIGIN", DEFAULT_FRONTEND_ORIGIN);
        let frontend_origin = HeaderValue::from_str(&origin)
            .with_context(|| format!("Invalid QRSIM_FRONTEND_ORIGIN: {}", origin))?;

        Ok(Self {
            bind_addr,
            storage,
            database_url: get("QRSIM_DATABASE_URL", DEFAULT_DATABASE_URL),
            tick_interval,
            frontend_origin,
            log_filter: get("QRSIM_LOG", DEFAULT_LOG_FILTER),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).expect("Defaults should be valid");
        assert_eq!(config.bind_addr, "127.0.0.1:5000".parse().unwrap());
        assert_eq!(config.storage, StorageKind::Sqlite);
        assert_eq!(config.database_url, "sqlite:qr_simulator.db");
        assert_eq!(config.tick_interval, Duration::from_secs(5));
        assert_eq!(config.frontend_origin, "http://localhost:5173");
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("QRSIM_BIND_ADDR", "0.0.0.0:8080"),
            ("QRSIM_STORAGE", "Memory"),
            ("QRSIM_TICK_INTERVAL_SECS", "2"),
            ("QRSIM_LOG", "debug"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.storage, StorageKind::Memory);
        assert_eq!(config.tick_interval, Duration::from_secs(2));
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(config_from(&[("QRSIM_BIND_ADDR", "localhost")]).is_err());
        assert!(config_from(&[("QRSIM_STORAGE", "postgres")]).is_err());
        assert!(config_from(&[("QRSIM_TICK_INTERVAL_SECS", "0")]).is_err());
        assert!(config_from(&[("QRSIM_TICK_INTERVAL_SECS", "five")]).is_err());
    }
}
