//! End-to-end workflow tests for facegate-cli.
//!
//! Each test runs the binary against a local mock of the verification
//! service, with a directory of generated frames standing in for the camera.
//! Login runs in real time, so the match path takes about four seconds.

use std::path::Path;

use assert_cmd::Command;
use image::{Rgb, RgbImage};
use mockito::{Matcher, Server};
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;

/// Get a Command for the facegate binary pointed at `server`.
fn facegate(server: &Server) -> Command {
    let mut cmd = Command::cargo_bin("facegate").unwrap();
    cmd.env_remove("RUST_LOG")
        .env("FACEGATE_API_BASE_URL", format!("{}/", server.url()));
    cmd
}

/// Write a few distinct PNG frames into `dir`.
fn write_frames(dir: &Path) {
    for i in 0..3u8 {
        let frame = RgbImage::from_fn(32, 24, |x, y| {
            Rgb([(x as u8).wrapping_mul(8), (y as u8).wrapping_mul(10), i * 60])
        });
        frame.save(dir.join(format!("frame_{i:02}.png"))).unwrap();
    }
}

// ============================================================================
// Complete Workflow Tests: Enroll -> Login
// ============================================================================

#[test]
fn test_e2e_enroll_then_login() {
    let temp = TempDir::new().unwrap();
    write_frames(temp.path());
    let mut server = Server::new();

    let enroll = server
        .mock("POST", "/api/enroll")
        .match_header("content-type", "application/json")
        .match_body(Matcher::PartialJson(json!({ "user_id": "alice" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok":true,"user_id":"alice"}"#)
        .expect(1)
        .create();

    let verify = server
        .mock("POST", "/api/verify")
        .match_body(Matcher::PartialJson(json!({ "user_id": "alice" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"match":true,"similarity":0.93}"#)
        .expect(1)
        .create();

    // Step 1: enroll three frames
    facegate(&server)
        .args(["enroll", "--user", " alice ", "--frames"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Captured image 3/3"))
        .stdout(predicate::str::contains("Face enrolled!"));
    enroll.assert();

    // Step 2: log in with the same identity
    facegate(&server)
        .args(["login", "--user", "alice", "--frames"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("UNLOCKED"))
        .stdout(predicate::str::contains("93.0%"));
    verify.assert();
}

#[test]
fn test_e2e_enroll_rejected_reports_server_reason() {
    let temp = TempDir::new().unwrap();
    write_frames(temp.path());
    let mut server = Server::new();

    let enroll = server
        .mock("POST", "/api/enroll")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok":false,"detail":"duplicate id"}"#)
        .expect(1)
        .create();

    // Exit code 65 = EX_DATAERR
    facegate(&server)
        .args(["enroll", "--user", "alice", "--frames"])
        .arg(temp.path())
        .assert()
        .code(65)
        .stderr(predicate::str::contains("duplicate id"));
    enroll.assert();
}

#[test]
fn test_e2e_login_not_recognized() {
    let temp = TempDir::new().unwrap();
    write_frames(temp.path());
    let mut server = Server::new();

    let verify = server
        .mock("POST", "/api/verify")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"match":false}"#)
        .expect(1)
        .create();

    facegate(&server)
        .args(["login", "--user", "bob", "--frames"])
        .arg(temp.path())
        .assert()
        .code(65)
        .stderr(predicate::str::contains("Face not recognized"))
        .stdout(predicate::str::contains("UNLOCKED").not());
    verify.assert();
}

#[test]
fn test_e2e_login_service_error() {
    let temp = TempDir::new().unwrap();
    write_frames(temp.path());
    let mut server = Server::new();

    let verify = server
        .mock("POST", "/api/verify")
        .with_status(503)
        .with_header("content-type", "text/html")
        .with_body("<html>Service Unavailable</html>")
        .expect(1)
        .create();

    // Exit code 69 = EX_UNAVAILABLE
    facegate(&server)
        .args(["login", "--user", "carol", "--frames"])
        .arg(temp.path())
        .assert()
        .code(69)
        .stderr(predicate::str::contains("Login failed"));
    verify.assert();
}

#[test]
fn test_e2e_quiet_prints_nothing_on_success() {
    let temp = TempDir::new().unwrap();
    write_frames(temp.path());
    let mut server = Server::new();

    server
        .mock("POST", "/api/enroll")
        .with_status(200)
        .with_body(r#"{"ok":true}"#)
        .create();

    facegate(&server)
        .args(["enroll", "-q", "--user", "dana", "--frames"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}
