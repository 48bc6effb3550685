//! Integration tests for logging system

use bridge_traits::LogLevel;
use core_runtime::logging::{
    init_logging, mask_identifier, redact_if_sensitive, LogFormat, LoggingConfig,
};

#[test]
fn test_logging_initialization_is_once_per_process() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug)
        .with_spans(false);

    // Only this test installs a global subscriber in this binary.
    init_logging(config.clone()).expect("first initialization succeeds");

    let err = init_logging(config).unwrap_err();
    assert!(err.to_string().contains("Failed to initialize logging"));

    tracing::debug!(target: "core_contacts", "logging initialized");
}

#[test]
fn test_pii_redaction_contact_fields() {
    assert_eq!(redact_if_sensitive("family_name", "Appleseed"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("nickname", "Johnny"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("note", "allergic to nuts"), "[REDACTED]");
}

#[test]
fn test_pii_redaction_emails() {
    let redacted = redact_if_sensitive("email", "user@example.com");

    assert!(redacted.starts_with('u'));
    assert!(redacted.contains("[REDACTED]"));
    assert!(!redacted.contains("example.com"));
}

#[test]
fn test_pii_redaction_phone_numbers() {
    assert_eq!(redact_if_sensitive("phone_number", "555-0100"), "***00");
    assert_eq!(redact_if_sensitive("phone", "7"), "[REDACTED]");
}

#[test]
fn test_pii_redaction_normal_values() {
    assert_eq!(redact_if_sensitive("operation", "groups"), "groups");
    assert_eq!(redact_if_sensitive("count", "3"), "3");
    assert_eq!(redact_if_sensitive("kind", "lookup"), "lookup");
}

#[test]
fn test_identifier_masking() {
    assert_eq!(
        mask_identifier("410FE041-5C4E-48DA"),
        "410F**************"
    );
    assert_eq!(mask_identifier("1234"), "****");
}

#[test]
fn test_filter_configuration() {
    let config = LoggingConfig::default().with_filter("core_publisher=trace,core_contacts=debug");

    assert_eq!(
        config.filter,
        Some("core_publisher=trace,core_contacts=debug".to_string())
    );
}

#[test]
fn test_config_chaining() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_level(LogLevel::Warn)
        .with_pii_redaction(false)
        .with_spans(false)
        .with_target(false)
        .with_thread_info(true);

    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, LogLevel::Warn);
    assert!(!config.redact_pii);
    assert!(!config.enable_spans);
    assert!(!config.display_target);
    assert!(config.display_thread_info);
}
