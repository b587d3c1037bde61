// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as valid bind addresses, non-empty paths, and sane
//! sweep intervals.

use crate::diagnostic::ConfigError;
use crate::model::ParlorConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ParlorConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.service.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "service.log_level `{}` is not one of {}",
                config.service.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("server.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if config.server.request_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "server.request_timeout_secs must be at least 1".to_string(),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.chat.reap_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "chat.reap_interval_secs must be at least 1".to_string(),
        });
    }

    if config.chat.reap_after_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "chat.reap_after_secs must be at least 1".to_string(),
        });
    }

    if config.chat.purge_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "chat.purge_interval_secs must be at least 1".to_string(),
        });
    }

    if config.chat.retention_days == 0 {
        errors.push(ConfigError::Validation {
            message: "chat.retention_days must be at least 1".to_string(),
        });
    }

    if config.chat.max_body_len == 0 {
        errors.push(ConfigError::Validation {
            message: "chat.max_body_len must be at least 1".to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
