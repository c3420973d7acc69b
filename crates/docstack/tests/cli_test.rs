use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("docstack").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("deploy"))
        .stdout(predicate::str::contains("destroy"))
        .stdout(predicate::str::contains("resources"))
        .stdout(predicate::str::contains("status"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("docstack").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("docstack"));
}

#[test]
fn test_deploy_help_lists_overrides() {
    let mut cmd = Command::cargo_bin("docstack").unwrap();
    cmd.arg("deploy")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--resource-group"))
        .stdout(predicate::str::contains("--location"))
        .stdout(predicate::str::contains("--storage-account"));
}

#[test]
fn test_destroy_requires_resource_group() {
    let mut cmd = Command::cargo_bin("docstack").unwrap();
    cmd.arg("destroy").assert().failure();
}

#[test]
fn test_destroy_without_yes_does_not_proceed() {
    let mut cmd = Command::cargo_bin("docstack").unwrap();
    cmd.arg("destroy")
        .arg("rg-test")
        .assert()
        .success()
        .stdout(predicate::str::contains("--yes"));
}
