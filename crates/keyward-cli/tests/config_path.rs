use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn test_config_path_command() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("keyward")
        .env("KEYWARD_HOME", dir.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_init_creates_file() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");

    assert!(!config_path.exists());

    cargo_bin_cmd!("keyward")
        .env("KEYWARD_HOME", dir.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config at"));

    assert!(config_path.exists());

    let contents = fs::read_to_string(&config_path).unwrap();
    assert!(contents.contains("refresh_leeway_secs ="));
    assert!(contents.contains("# refresh_url ="));
}

#[test]
fn test_config_init_fails_if_exists() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");

    fs::write(&config_path, "# existing config").unwrap();

    cargo_bin_cmd!("keyward")
        .env("KEYWARD_HOME", dir.path())
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_config_set_refresh_url_writes_file() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");

    cargo_bin_cmd!("keyward")
        .env("KEYWARD_HOME", dir.path())
        .args(["config", "set-refresh-url", "https://auth.example.com/token"])
        .assert()
        .success()
        .stdout(predicate::str::contains("refresh_url set to"));

    let contents = fs::read_to_string(&config_path).unwrap();
    assert!(contents.contains(r#"refresh_url = "https://auth.example.com/token""#));
}

#[test]
fn test_config_set_refresh_url_preserves_existing_fields() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");

    fs::write(&config_path, "refresh_leeway_secs = 60\n").unwrap();

    cargo_bin_cmd!("keyward")
        .env("KEYWARD_HOME", dir.path())
        .args(["config", "set-refresh-url", "https://auth.example.com/token"])
        .assert()
        .success();

    let contents = fs::read_to_string(&config_path).unwrap();
    assert!(contents.contains("refresh_leeway_secs = 60"));
    assert!(contents.contains("https://auth.example.com/token"));
}

#[test]
fn test_config_help_shows_subcommands() {
    cargo_bin_cmd!("keyward")
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("path"))
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("set-refresh-url"));
}
