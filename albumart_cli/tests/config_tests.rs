//! ConfigManager tests against isolated config files

use albumart_cli::config::{AppConfig, CliOverrides, ConfigManager};
use std::fs;
use tempfile::TempDir;

fn create_test_config_manager(temp_dir: &TempDir) -> ConfigManager {
    ConfigManager::with_path(temp_dir.path().join("config.toml"))
}

#[test]
fn test_defaults_without_file() {
    let temp_dir = TempDir::new().unwrap();
    let manager = create_test_config_manager(&temp_dir);

    let config = manager.load().unwrap();
    assert_eq!(config.client.max_concurrent_rows, 20);
    assert_eq!(config.dataset.artist_column, 1);
    assert_eq!(config.dataset.track_column, 3);
    assert_eq!(config.dataset.column_label, "Cover_image_url");
    assert!(config.output.progress_enabled);
}

#[test]
fn test_set_and_get_client_id() {
    let temp_dir = TempDir::new().unwrap();
    let mut manager = create_test_config_manager(&temp_dir);

    manager.set("client.client_id", "92d1e286").unwrap();

    assert!(temp_dir.path().join("config.toml").exists());
    assert_eq!(manager.get("client.client_id").unwrap(), "92d1e286");
}

#[test]
fn test_numeric_looking_id_stays_string() {
    let temp_dir = TempDir::new().unwrap();
    let mut manager = create_test_config_manager(&temp_dir);

    manager.set("client.client_id", "12345").unwrap();

    let content = fs::read_to_string(temp_dir.path().join("config.toml")).unwrap();
    assert!(content.contains("client_id = \"12345\""));
    let config = manager.load().unwrap();
    assert_eq!(config.client.client_id.as_deref(), Some("12345"));
}

#[test]
fn test_secret_is_masked_on_read() {
    let temp_dir = TempDir::new().unwrap();
    let mut manager = create_test_config_manager(&temp_dir);

    manager.set("client.client_secret", "c7a5688b").unwrap();

    assert_eq!(manager.get("client.client_secret").unwrap(), "********");
    let listed = manager.list().unwrap();
    let secret = listed
        .iter()
        .find(|(key, _)| key == "client.client_secret")
        .map(|(_, value)| value.as_str());
    assert_eq!(secret, Some("********"));

    // The stored value is still the real secret
    let config = manager.load().unwrap();
    assert_eq!(config.client.client_secret.as_deref(), Some("c7a5688b"));
}

#[test]
fn test_set_preserves_other_sections() {
    let temp_dir = TempDir::new().unwrap();
    let mut manager = create_test_config_manager(&temp_dir);

    manager.set("dataset.track_column", "4").unwrap();
    manager.set("output.progress_enabled", "false").unwrap();

    let config = manager.load().unwrap();
    assert_eq!(config.dataset.track_column, 4);
    assert!(!config.output.progress_enabled);
}

#[test]
fn test_validation_rejects_bad_values() {
    let temp_dir = TempDir::new().unwrap();
    let mut manager = create_test_config_manager(&temp_dir);

    assert!(manager.set("client.max_concurrent_rows", "0").is_err());
    assert!(manager.set("client.max_concurrent_rows", "many").is_err());
    assert!(manager.set("client.request_timeout_seconds", "0").is_err());
    assert!(manager.set("client.search_url", "ftp://example.com").is_err());
    assert!(manager.set("dataset.artist_column", "-1").is_err());
    assert!(manager.set("output.color_enabled", "maybe").is_err());
    assert!(!temp_dir.path().join("config.toml").exists());
}

#[test]
fn test_get_unknown_key() {
    let temp_dir = TempDir::new().unwrap();
    let manager = create_test_config_manager(&temp_dir);

    let err = manager.get("client.nonexistent").unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[test]
fn test_file_values_are_loaded() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("config.toml"),
        "[client]\nclient_id = \"abc\"\nmax_concurrent_rows = 5\n\n[dataset]\ncolumn_label = \"cover\"\n",
    )
    .unwrap();
    let manager = create_test_config_manager(&temp_dir);

    let config = manager.load().unwrap();
    assert_eq!(config.client.client_id.as_deref(), Some("abc"));
    assert_eq!(config.client.max_concurrent_rows, 5);
    assert_eq!(config.dataset.column_label, "cover");
    assert_eq!(config.dataset.artist_column, 1);
}

#[test]
fn test_cli_overrides_win() {
    let mut config = AppConfig::default();
    config.client.client_id = Some("from-file".to_string());

    config.apply_cli_overrides(&CliOverrides {
        client_id: Some("from-flag".to_string()),
        concurrency: Some(3),
        track_column: Some(2),
        ..Default::default()
    });

    assert_eq!(config.client.client_id.as_deref(), Some("from-flag"));
    assert_eq!(config.client.max_concurrent_rows, 3);
    assert_eq!(config.dataset.track_column, 2);
    assert_eq!(config.dataset.artist_column, 1);
}
