//! CLI integration tests for facegate-cli.
//!
//! These tests run the actual binary and check outputs and exit codes for
//! the paths that never reach the verification service.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a Command for the facegate binary.
fn facegate() -> Command {
    let mut cmd = Command::cargo_bin("facegate").unwrap();
    cmd.env_remove("FACEGATE_API_BASE_URL").env_remove("RUST_LOG");
    cmd
}

// ============================================================================
// Help and Version Tests
// ============================================================================

#[test]
fn test_help_displays_usage() {
    facegate()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Face enrollment and login"))
        .stdout(predicate::str::contains("enroll"))
        .stdout(predicate::str::contains("login"));
}

#[test]
fn test_version_displays_version() {
    facegate()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("facegate"));
}

#[test]
fn test_help_shows_exit_codes() {
    facegate()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exit codes:"))
        .stdout(predicate::str::contains("65"))
        .stdout(predicate::str::contains("66"))
        .stdout(predicate::str::contains("69"));
}

#[test]
fn test_enroll_help_shows_options() {
    facegate()
        .args(["enroll", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--user"))
        .stdout(predicate::str::contains("--frames"))
        .stdout(predicate::str::contains("--quality"))
        .stdout(predicate::str::contains("--api-url"));
}

#[test]
fn test_login_requires_user_and_frames() {
    facegate()
        .arg("login")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--user"));
}

#[test]
fn test_quiet_conflicts_with_verbose() {
    facegate()
        .args(["login", "-q", "-v", "--user", "alice", "--frames", "."])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

// ============================================================================
// Exit Code Tests
// ============================================================================

#[test]
fn test_empty_user_returns_usage_error() {
    let temp = TempDir::new().unwrap();

    // Exit code 64 = EX_USAGE
    facegate()
        .args(["enroll", "--user", "  ", "--frames"])
        .arg(temp.path())
        .assert()
        .code(64)
        .stderr(predicate::str::contains("Please enter a User ID"));

    facegate()
        .args(["login", "--user", "", "--frames"])
        .arg(temp.path())
        .assert()
        .code(64)
        .stderr(predicate::str::contains("Please enter your User ID"));
}

#[test]
fn test_missing_frames_dir_returns_camera_error() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("no-such-dir");

    // Exit code 66 = EX_NOINPUT
    facegate()
        .args(["login", "--user", "alice", "--frames"])
        .arg(&missing)
        .assert()
        .code(66)
        .stderr(predicate::str::contains("No camera device available."));
}

#[test]
fn test_frames_dir_without_images_returns_camera_error() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("notes.txt"), b"not a frame").unwrap();

    facegate()
        .args(["enroll", "--user", "alice", "--frames"])
        .arg(temp.path())
        .assert()
        .code(66);
}

#[test]
fn test_invalid_api_url_returns_usage_error() {
    let temp = TempDir::new().unwrap();

    facegate()
        .args(["--api-url", "ftp://faces.example", "login", "--user", "alice"])
        .arg("--frames")
        .arg(temp.path())
        .assert()
        .code(64)
        .stderr(predicate::str::contains(
            "Invalid verification service configuration",
        ));
}

#[test]
fn test_unparsable_api_url_returns_usage_error() {
    let temp = TempDir::new().unwrap();

    for url in ["http://exa mple.com", "http://localhost:99999"] {
        facegate()
            .args(["--api-url", url, "enroll", "--user", "alice"])
            .arg("--frames")
            .arg(temp.path())
            .assert()
            .code(64)
            .stderr(predicate::str::contains(
                "Invalid verification service configuration",
            ));
    }
}
