use std::fs;

use tiny_tree::config::Config;
use tiny_tree::error::ConfigError;
use tiny_tree::Spacing;

#[test]
fn missing_file_yields_defaults() {
    let tmp = tempfile::tempdir().expect("create tempdir");
    let config = Config::load_from(&tmp.path().join("absent.json")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn save_then_load() {
    let tmp = tempfile::tempdir().expect("create tempdir");
    let path = tmp.path().join("nested").join("config.json");

    let mut config = Config::default();
    config.spacing = Spacing { x: 35.0, y: 45.0 };
    config.token_output = "tokens.txt".into();
    config.save_to(&path).unwrap();

    assert_eq!(Config::load_from(&path).unwrap(), config);
}

#[test]
fn malformed_file_is_an_error() {
    let tmp = tempfile::tempdir().expect("create tempdir");
    let path = tmp.path().join("config.json");
    fs::write(&path, "{ spacing: ").unwrap();

    assert!(matches!(
        Config::load_from(&path),
        Err(ConfigError::Malformed { .. })
    ));
}
