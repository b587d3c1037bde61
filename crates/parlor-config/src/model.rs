// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Parlor support-chat service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Parlor configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ParlorConfig {
    /// Service identity and logging settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// HTTP/WebSocket gateway settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Chat lifecycle settings (reaper, purger, limits).
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name of the service.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "parlor".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// HTTP/WebSocket gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token for customer-facing routes. `None` disables auth for
    /// that scope (development only).
    #[serde(default)]
    pub customer_token: Option<String>,

    /// Bearer token for admin routes.
    #[serde(default)]
    pub admin_token: Option<String>,

    /// Bounded timeout applied to mutating requests, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            customer_token: None,
            admin_token: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8090
}

fn default_request_timeout_secs() -> u64 {
    5
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("parlor").join("parlor.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("parlor.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Chat lifecycle configuration: background sweeps and input limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    /// How often the inactivity reaper scans for abandoned sessions, in seconds.
    #[serde(default = "default_reap_interval_secs")]
    pub reap_interval_secs: u64,

    /// A pending session with no admin reply is closed once the last
    /// customer activity is older than this, in seconds.
    #[serde(default = "default_reap_after_secs")]
    pub reap_after_secs: u64,

    /// How often the retention purger runs, in seconds.
    #[serde(default = "default_purge_interval_secs")]
    pub purge_interval_secs: u64,

    /// Soft-deleted messages older than this many days are purged permanently.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// Maximum message body length in characters, after trimming.
    #[serde(default = "default_max_body_len")]
    pub max_body_len: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            reap_interval_secs: default_reap_interval_secs(),
            reap_after_secs: default_reap_after_secs(),
            purge_interval_secs: default_purge_interval_secs(),
            retention_days: default_retention_days(),
            max_body_len: default_max_body_len(),
        }
    }
}

fn default_reap_interval_secs() -> u64 {
    60
}

fn default_reap_after_secs() -> u64 {
    5 * 60
}

fn default_purge_interval_secs() -> u64 {
    24 * 60 * 60
}

fn default_retention_days() -> u32 {
    30
}

fn default_max_body_len() -> usize {
    4000
}
