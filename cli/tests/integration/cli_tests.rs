//! Integration tests for the pipgate CLI surface
//!
//! These tests verify the command hierarchy and argument parsing.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn pipgate() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("pipgate"));
    cmd.env("NO_COLOR", "1");
    cmd
}

// --- Help and version tests ---

#[test]
fn test_cli_no_args_shows_help_and_exits_two() {
    // clap with arg_required_else_help shows help on stderr and exits 2
    pipgate().assert().code(2).stderr(predicate::str::contains(
        "Secure pip wrapper gated by a package firewall",
    ));
}

#[test]
fn test_cli_help_flag_shows_help() {
    pipgate()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"));
}

#[test]
fn test_cli_version_flag_shows_version() {
    pipgate()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pipgate"));
}

#[test]
fn test_version_command_shows_version() {
    pipgate()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pipgate 0.1.0"));
}

#[test]
fn test_version_command_json_outputs_valid_json() {
    pipgate()
        .arg("version")
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"version":"0.1.0"}"#));
}

// --- Command hierarchy tests ---

#[test]
fn test_help_shows_install_command() {
    pipgate()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("install"));
}

#[test]
fn test_help_shows_audit_command() {
    pipgate()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("audit"));
}

#[test]
fn test_help_shows_check_command() {
    pipgate()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("check"));
}

#[test]
fn test_install_help_lists_pip_passthrough_flags() {
    pipgate()
        .args(["install", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--force"))
        .stdout(predicate::str::contains("--requirement"))
        .stdout(predicate::str::contains("--index-url"))
        .stdout(predicate::str::contains("--no-deps"));
}

#[test]
fn test_unknown_command_exits_two() {
    pipgate().arg("bogus").assert().code(2);
}

// --- Argument validation ---

#[test]
fn test_install_without_packages_fails() {
    pipgate()
        .arg("install")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no packages specified"));
}

#[test]
fn test_install_missing_requirements_file_fails() {
    pipgate()
        .args(["install", "-r", "/nonexistent/requirements.txt"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("requirements"));
}

#[test]
fn test_audit_requires_a_package() {
    pipgate().arg("audit").assert().code(2);
}
