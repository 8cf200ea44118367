//! Smoke tests to verify command wiring

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_lists_commands() {
    let mut cmd = Command::cargo_bin("lexiplan").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("migrate"))
        .stdout(predicate::str::contains("tokenize"));
}

#[test]
fn test_serve_help() {
    let mut cmd = Command::cargo_bin("lexiplan").unwrap();
    cmd.arg("serve").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--cors-permissive"))
        .stdout(predicate::str::contains("LEXIPLAN_BIND"));
}

#[test]
fn test_tokenize_argument() {
    let mut cmd = Command::cargo_bin("lexiplan").unwrap();
    cmd.arg("tokenize").arg("Hello, world!");

    let output = cmd.assert().success().get_output().stdout.clone();
    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["text"], "Hello, world!");
    let texts: Vec<&str> = json["tokens"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, ["Hello", ",", "world", "!"]);
    assert_eq!(json["tokens"][1]["kind"], "punctuation");
}

#[test]
fn test_tokenize_stdin() {
    let mut cmd = Command::cargo_bin("lexiplan").unwrap();
    cmd.arg("tokenize").write_stdin("Wait...");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(r#""text":"Wait""#))
        .stdout(predicate::str::contains(r#""position":3"#));
}

#[test]
fn test_migrate_without_config_fails() {
    let mut cmd = Command::cargo_bin("lexiplan").unwrap();
    cmd.arg("migrate")
        .current_dir(std::env::temp_dir())
        .env_remove("DB_HOST")
        .env_remove("DB_USER")
        .env_remove("DB_NAME");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("DB_HOST"));
}
