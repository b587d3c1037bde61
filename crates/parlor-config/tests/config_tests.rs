// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Parlor configuration system.

use parlor_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_parlor_config() {
    let toml = r#"
[service]
name = "support-chat"
log_level = "debug"

[server]
host = "0.0.0.0"
port = 9100
customer_token = "cust-secret"
admin_token = "admin-secret"
request_timeout_secs = 3

[storage]
database_path = "/tmp/parlor-test.db"
wal_mode = false

[chat]
reap_interval_secs = 30
reap_after_secs = 120
purge_interval_secs = 3600
retention_days = 14
max_body_len = 2000
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.service.name, "support-chat");
    assert_eq!(config.service.log_level, "debug");
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9100);
    assert_eq!(config.server.customer_token.as_deref(), Some("cust-secret"));
    assert_eq!(config.server.admin_token.as_deref(), Some("admin-secret"));
    assert_eq!(config.server.request_timeout_secs, 3);
    assert_eq!(config.storage.database_path, "/tmp/parlor-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.chat.reap_interval_secs, 30);
    assert_eq!(config.chat.reap_after_secs, 120);
    assert_eq!(config.chat.purge_interval_secs, 3600);
    assert_eq!(config.chat.retention_days, 14);
    assert_eq!(config.chat.max_body_len, 2000);
}

/// Unknown field in [chat] section produces an error.
#[test]
fn unknown_field_in_chat_produces_error() {
    let toml = r#"
[chat]
reap_intreval_secs = 30
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("reap_intreval_secs"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.service.name, "parlor");
    assert_eq!(config.service.log_level, "info");
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8090);
    assert!(config.server.customer_token.is_none());
    assert!(config.server.admin_token.is_none());
    assert!(config.storage.wal_mode);
    assert_eq!(config.chat.reap_interval_secs, 60);
    assert_eq!(config.chat.reap_after_secs, 300);
    assert_eq!(config.chat.retention_days, 30);
}

/// Semantic validation catches zeroed sweep intervals after deserialization.
#[test]
fn zeroed_intervals_fail_validation() {
    let toml = r#"
[chat]
reap_interval_secs = 0
purge_interval_secs = 0
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail validation");
    assert_eq!(errors.len(), 2);
}

/// Validation passes for a realistic production config.
#[test]
fn realistic_config_passes_validation() {
    let toml = r#"
[server]
host = "0.0.0.0"
port = 8090
admin_token = "s3cret"

[storage]
database_path = "/var/lib/parlor/parlor.db"
"#;

    let config = load_and_validate_str(toml).expect("should validate");
    assert_eq!(config.server.admin_token.as_deref(), Some("s3cret"));
}
