//! Configuration graceful degradation
//!
//! A missing or partial config file must never stop the station from
//! starting. Tests touching process environment are marked `#[serial]`.

use radio_common::config::{default_root_folder, resolve_root_folder, TomlConfig};
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_default_root_folder_is_named_radio() {
    let root = default_root_folder();
    assert!(!root.as_os_str().is_empty());
    assert!(root.to_string_lossy().contains("radio"));
}

#[test]
fn test_load_or_default_never_fails() {
    // Whatever the host has installed, this must return a value
    let _ = TomlConfig::load_or_default();
}

#[test]
fn test_unknown_keys_are_ignored() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "log_level = \"debug\"\nbackground_interval_secs = 30\n").unwrap();

    let config = TomlConfig::load(&path).unwrap();
    assert_eq!(config.background_interval_secs, Some(30));
    assert_eq!(config.root_folder, None);
}

#[test]
fn test_empty_file_is_all_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "").unwrap();

    assert_eq!(TomlConfig::load(&path).unwrap(), TomlConfig::default());
}

#[test]
#[serial]
fn test_empty_env_var_falls_through() {
    env::set_var("RADIO_ROOT_FOLDER_EMPTY_TEST", "");
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/from/toml")),
        ..Default::default()
    };

    assert_eq!(
        resolve_root_folder(None, "RADIO_ROOT_FOLDER_EMPTY_TEST", Some(&toml)),
        PathBuf::from("/from/toml")
    );
    env::remove_var("RADIO_ROOT_FOLDER_EMPTY_TEST");
}
