//! Config Tests
//!
//! Devices built from `catena.toml`.

use catena::{DetailLevel, Device, DeviceConfig, StatusCode, CONFIG_FILE_NAME, DEFAULT_SCOPE};
use std::fs;
use tempfile::TempDir;

#[test]
fn default_file_builds_default_device() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);

    DeviceConfig::write_default_if_missing(&path).unwrap();
    let config = DeviceConfig::from_file(&path).unwrap();
    let dev = Device::with_config(&config).unwrap();

    assert_eq!(dev.slot(), 0);
    assert_eq!(dev.detail_level(), DetailLevel::Full);
    assert_eq!(dev.default_scope(), DEFAULT_SCOPE);
    assert!(dev.multi_set_enabled());
    assert!(dev.subscriptions());
    assert_eq!(dev.default_max_length(), 1024);
    assert_eq!(dev.default_total_length(), 1024);
}

#[test]
fn existing_file_is_not_overwritten() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    fs::write(&path, "slot = 4\n").unwrap();

    DeviceConfig::write_default_if_missing(&path).unwrap();
    let config = DeviceConfig::from_file(&path).unwrap();
    assert_eq!(config.slot, 4);
    assert_eq!(config.detail_level, "full");
}

#[test]
fn custom_file_shapes_the_device() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    fs::write(
        &path,
        r#"
slot = 9
detail_level = "commands"
default_scope = "st2138:op"
multi_set_enabled = false
subscriptions = false
default_max_length = 16
default_total_length = 64
"#,
    )
    .unwrap();

    let dev = Device::with_config(&DeviceConfig::from_file(&path).unwrap()).unwrap();
    let header = dev.header();
    assert_eq!(header.slot, 9);
    assert_eq!(header.detail_level, DetailLevel::Commands);
    assert_eq!(header.default_scope, "st2138:op");
    assert!(!header.multi_set_enabled);
    assert!(!header.subscriptions);
    assert_eq!(dev.default_max_length(), 16);
    assert_eq!(dev.default_total_length(), 64);
    assert_eq!(dev.add_subscription("/x").unwrap_err().code(), StatusCode::Unimplemented);
}

#[test]
fn written_config_reads_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    let config = DeviceConfig {
        slot: 3,
        detail_level: "minimal".to_string(),
        ..DeviceConfig::default()
    };

    config.write_to_file(&path).unwrap();
    let loaded = DeviceConfig::from_file(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.detail_level().unwrap(), DetailLevel::Minimal);
}

#[test]
fn bad_files_are_invalid_arguments() {
    let dir = TempDir::new().unwrap();

    let missing = dir.path().join("missing.toml");
    let err = DeviceConfig::from_file(&missing).unwrap_err();
    assert_eq!(err.code(), StatusCode::InvalidArgument);

    let garbled = dir.path().join("garbled.toml");
    fs::write(&garbled, "slot = [").unwrap();
    let err = DeviceConfig::from_file(&garbled).unwrap_err();
    assert_eq!(err.code(), StatusCode::InvalidArgument);

    let unknown = dir.path().join("unknown.toml");
    fs::write(&unknown, "detail_level = \"verbose\"\n").unwrap();
    let err = DeviceConfig::from_file(&unknown).unwrap_err();
    assert_eq!(err.code(), StatusCode::InvalidArgument);
}

#[test]
fn unknown_level_fails_device_construction() {
    let config = DeviceConfig {
        detail_level: "loud".to_string(),
        ..DeviceConfig::default()
    };
    let err = Device::with_config(&config).unwrap_err();
    assert_eq!(err.code(), StatusCode::InvalidArgument);
}
