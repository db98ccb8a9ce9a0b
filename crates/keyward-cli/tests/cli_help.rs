use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_shows_all_commands() {
    cargo_bin_cmd!("keyward")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("logout"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_login_help_shows_flags() {
    cargo_bin_cmd!("keyward")
        .args(["login", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--access"))
        .stdout(predicate::str::contains("--refresh"));
}

#[test]
fn test_version_flag() {
    cargo_bin_cmd!("keyward")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1"));
}
