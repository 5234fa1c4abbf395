//! Environment-driven service configuration.
//!
//! All settings come from environment variables (optionally via a `.env`
//! file loaded at startup). The catalog endpoint variables follow the
//! upstream naming (`DATAHUB_GMS_*`); service-local knobs use the
//! `MONITOR_*` prefix.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u16(key: &str, default: u16) -> u16 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    match env_opt(key) {
        Some(v) => matches!(v.as_str(), "true" | "1"),
        None => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub monitors: MonitorConfig,
    pub server: ServerConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            catalog: CatalogConfig::from_env(),
            monitors: MonitorConfig::from_env(),
            server: ServerConfig::from_env(),
        }
    }
}

// ── Catalog endpoint ──────────────────────────────────────────

/// Where to reach the upstream metadata catalog (GMS).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub protocol: String,
    pub host: String,
    pub port: u16,
    /// System client credentials; both must be set for authenticated calls.
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl CatalogConfig {
    pub fn from_env() -> Self {
        Self {
            protocol: env_or("DATAHUB_GMS_PROTOCOL", "http"),
            host: env_or("DATAHUB_GMS_HOST", "localhost"),
            port: env_u16("DATAHUB_GMS_PORT", 8080),
            client_id: env_opt("DATAHUB_SYSTEM_CLIENT_ID"),
            client_secret: env_opt("DATAHUB_SYSTEM_CLIENT_SECRET"),
        }
    }

    /// Base URL of the catalog, e.g. `http://localhost:8080`.
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }
}

// ── Monitor engine knobs ──────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// How often the manager reconciles with the catalog.
    pub refresh_interval_minutes: u64,
    /// Maximum number of concurrently running evaluations.
    pub worker_pool_size: usize,
    /// Wall-clock cap applied to a single evaluation.
    pub evaluation_timeout_secs: u64,
    /// Trigger schedule used when an assertion spec carries none.
    pub default_schedule: String,
    /// Trigger timezone used when an assertion spec carries none.
    pub default_timezone: String,
    /// Page size for the monitor search call.
    pub list_monitors_batch_size: u32,
}

impl MonitorConfig {
    pub fn from_env() -> Self {
        Self {
            refresh_interval_minutes: env_u64("MONITOR_REFRESH_INTERVAL_MINUTES", 1),
            worker_pool_size: env_u32("MONITOR_WORKER_POOL_SIZE", 10) as usize,
            evaluation_timeout_secs: env_u64("MONITOR_EVALUATION_TIMEOUT_SECS", 300),
            default_schedule: env_or("MONITOR_DEFAULT_SCHEDULE", "0 * * * *"),
            default_timezone: env_or("MONITOR_DEFAULT_TIMEZONE", "America/Los_Angeles"),
            list_monitors_batch_size: env_u32("MONITOR_LIST_BATCH_SIZE", 1000),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_minutes * 60)
    }

    pub fn evaluation_timeout(&self) -> Duration {
        Duration::from_secs(self.evaluation_timeout_secs)
    }
}

// ── HTTP server ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port for the health endpoint.
    pub port: u16,
    /// Raise log verbosity to debug.
    pub debug: bool,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            port: env_u16("MONITOR_SERVER_PORT", 8431),
            debug: env_bool("DATAHUB_DEBUG", false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_base_url() {
        let cfg = CatalogConfig {
            protocol: "https".to_string(),
            host: "gms.internal".to_string(),
            port: 9002,
            client_id: None,
            client_secret: None,
        };
        assert_eq!(cfg.base_url(), "https://gms.internal:9002");
    }

    #[test]
    fn monitor_durations() {
        let cfg = MonitorConfig {
            refresh_interval_minutes: 5,
            worker_pool_size: 10,
            evaluation_timeout_secs: 120,
            default_schedule: "0 * * * *".to_string(),
            default_timezone: "UTC".to_string(),
            list_monitors_batch_size: 1000,
        };
        assert_eq!(cfg.refresh_interval(), Duration::from_secs(300));
        assert_eq!(cfg.evaluation_timeout(), Duration::from_secs(120));
    }
}
