//! Configuration Module
//!
//! Handles loading and managing configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default byte capacity of the bounded store (8 MiB).
pub const DEFAULT_CAPACITY_BYTES: usize = 8 * 1024 * 1024;

/// Default canonical-ID shape, e.g. `p1`, `proj_abc`, `doc_123`.
pub const DEFAULT_ID_PATTERN: &str = r"^[A-Za-z]+(_[A-Za-z0-9]+|[0-9][A-Za-z0-9]*)$";

/// Auth/session keys that an emergency purge never removes.
pub const DEFAULT_PROTECTED_KEYS: &[&str] = &["auth_token", "session", "user"];

/// Layer configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum total bytes held by the bounded store
    pub capacity_bytes: usize,
    /// Lifetime of an existence record in seconds
    pub existence_ttl: u64,
    /// Lifetime of an in-flight prefetch marker in seconds
    pub inflight_window: u64,
    /// Interval in seconds between in-flight marker sweeps
    pub sweep_interval: u64,
    /// HTTP server port
    pub server_port: u16,
    /// File backing the store; in-memory when unset
    pub storage_path: Option<PathBuf>,
    /// JSON catalog served by the built-in collaborator
    pub catalog_path: Option<PathBuf>,
    /// Regex describing the canonical-ID shape
    pub id_pattern: String,
    /// Keys exempt from LRU eviction and emergency purge
    pub protected_keys: Vec<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `STORE_CAPACITY_BYTES` - Store capacity (default: 8388608)
    /// - `EXISTENCE_TTL_SECS` - Existence record TTL (default: 600)
    /// - `INFLIGHT_WINDOW_SECS` - In-flight marker window (default: 600)
    /// - `SWEEP_INTERVAL_SECS` - In-flight sweep frequency (default: 60)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `STORAGE_PATH` - Store file path (default: in-memory)
    /// - `CATALOG_PATH` - Catalog JSON path (default: empty catalog)
    /// - `ID_PATTERN` - Canonical-ID regex
    /// - `PROTECTED_KEYS` - Comma-separated protected keys
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            capacity_bytes: parse_var("STORE_CAPACITY_BYTES").unwrap_or(defaults.capacity_bytes),
            existence_ttl: parse_var("EXISTENCE_TTL_SECS").unwrap_or(defaults.existence_ttl),
            inflight_window: parse_var("INFLIGHT_WINDOW_SECS").unwrap_or(defaults.inflight_window),
            sweep_interval: parse_var::<u64>("SWEEP_INTERVAL_SECS")
                .map(|secs| secs.max(1))
                .unwrap_or(defaults.sweep_interval),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            storage_path: non_empty_var("STORAGE_PATH").map(PathBuf::from),
            catalog_path: non_empty_var("CATALOG_PATH").map(PathBuf::from),
            id_pattern: non_empty_var("ID_PATTERN").unwrap_or(defaults.id_pattern),
            protected_keys: non_empty_var("PROTECTED_KEYS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|k| !k.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or(defaults.protected_keys),
        }
    }

    pub fn existence_ttl_ms(&self) -> u64 {
        self.existence_ttl.saturating_mul(1000)
    }

    /// Time between sweeps, never shorter than one second.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval.max(1))
    }

    pub fn inflight_window_ms(&self) -> u64 {
        self.inflight_window.saturating_mul(1000)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity_bytes: DEFAULT_CAPACITY_BYTES,
            existence_ttl: 600,
            inflight_window: 600,
            sweep_interval: 60,
            server_port: 3000,
            storage_path: None,
            catalog_path: None,
            id_pattern: DEFAULT_ID_PATTERN.to_string(),
            protected_keys: DEFAULT_PROTECTED_KEYS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
