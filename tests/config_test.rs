//! Configuration loading tests
//!
//! Environment overrides mutate process state, so those tests run serially.

use biocapture::config::AppConfig;
use biocapture::CaptureError;
use serial_test::serial;
use std::fs;
use std::path::PathBuf;

#[test]
#[serial]
fn test_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig::load_from(dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, AppConfig::default());
}

#[test]
#[serial]
fn test_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("biocapture.toml");
    fs::write(
        &path,
        r#"
[application]
name = "Lab"
log_level = "debug"
log_format = "json"

[storage]
profiles_path = "/data/profiles.json"
collections_path = "/data/collections.json"

[device]
model_name = "Canon EOS R5"
"#,
    )
    .unwrap();

    let config = AppConfig::load_from(&path).unwrap();
    assert_eq!(config.application.name, "Lab");
    assert_eq!(config.application.log_format, "json");
    assert_eq!(config.storage.profiles_path, PathBuf::from("/data/profiles.json"));
    assert_eq!(config.device.model_name, "Canon EOS R5");
    // Untouched sections keep their defaults
    assert_eq!(config.session.easter_egg_token, "queen");
    assert_eq!(config.device.image_delay_ms, 50);
}

#[test]
#[serial]
fn test_env_overrides_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("biocapture.toml");
    fs::write(&path, "[application]\nname = \"Lab\"\nlog_level = \"info\"\n").unwrap();

    std::env::set_var("BIOCAPTURE_APPLICATION__LOG_LEVEL", "warn");
    std::env::set_var("BIOCAPTURE_SESSION__EASTER_EGG_TOKEN", "bee");
    let result = AppConfig::load_from(&path);
    std::env::remove_var("BIOCAPTURE_APPLICATION__LOG_LEVEL");
    std::env::remove_var("BIOCAPTURE_SESSION__EASTER_EGG_TOKEN");

    let config = result.unwrap();
    assert_eq!(config.application.log_level, "warn");
    assert_eq!(config.session.easter_egg_token, "bee");
}

#[test]
#[serial]
fn test_invalid_values_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("biocapture.toml");
    fs::write(&path, "[application]\nname = \"Lab\"\nlog_level = \"loud\"\n").unwrap();
    assert!(matches!(
        AppConfig::load_from(&path),
        Err(CaptureError::Config(_))
    ));

    fs::write(&path, "[session]\ncommand_capacity = \"many\"\n").unwrap();
    assert!(matches!(
        AppConfig::load_from(&path),
        Err(CaptureError::Config(_))
    ));
}

#[test]
#[serial]
fn test_bundled_config_loads() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/biocapture.toml");
    let config = AppConfig::load_from(path).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.session.command_capacity, 32);
}
