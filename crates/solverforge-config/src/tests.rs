//! Tests for network configuration.

use std::io::Write;

use super::*;

#[test]
fn test_toml_parsing() {
    let toml = r#"
        environment_mode = "fast_assert"
        queue_capacity = 16
    "#;

    let config = NetworkConfig::from_toml_str(toml).unwrap();
    assert_eq!(config.environment_mode, EnvironmentMode::FastAssert);
    assert_eq!(config.queue_capacity, 16);
}

#[test]
fn test_yaml_parsing() {
    let yaml = r#"
        environment_mode: reproducible
        queue_capacity: 32
    "#;

    let config = NetworkConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.environment_mode, EnvironmentMode::Reproducible);
    assert_eq!(config.queue_capacity, 32);
}

#[test]
fn test_defaults_for_missing_fields() {
    let config = NetworkConfig::from_toml_str("").unwrap();
    assert_eq!(config.environment_mode, EnvironmentMode::NonReproducible);
    assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
}

#[test]
fn test_zero_capacity_is_invalid() {
    let err = NetworkConfig::from_toml_str("queue_capacity = 0").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_unknown_environment_mode_is_rejected() {
    let err = NetworkConfig::from_toml_str(r#"environment_mode = "paranoid""#).unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)));
}

#[test]
fn test_asserted_modes() {
    assert!(!EnvironmentMode::NonReproducible.is_asserted());
    assert!(!EnvironmentMode::Reproducible.is_asserted());
    assert!(EnvironmentMode::FastAssert.is_asserted());
    assert!(EnvironmentMode::FullAssert.is_asserted());
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "environment_mode = \"full_assert\"").unwrap();

    let config = NetworkConfig::load(file.path()).unwrap();
    assert_eq!(config.environment_mode, EnvironmentMode::FullAssert);
}

#[test]
fn test_missing_file_is_io_error() {
    let err = NetworkConfig::load("/nonexistent/network.toml").unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_builder() {
    let config = NetworkConfig::new()
        .with_environment_mode(EnvironmentMode::FullAssert)
        .with_queue_capacity(8);

    assert!(config.environment_mode.is_asserted());
    assert_eq!(config.queue_capacity, 8);
}
