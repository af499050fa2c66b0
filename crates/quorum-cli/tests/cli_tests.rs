//! Integration tests for the `quorum` CLI binary.
//!
//! These tests use `assert_cmd` and `predicates` to run the `schedule` and
//! `check` subcommands through the actual binary, covering file and stdin
//! input, exit codes, JSON output and error reporting.

// `Command::cargo_bin` was deprecated in assert_cmd 2.1.2 in favor of
// `cargo::cargo_bin_cmd!`. Allow it until we migrate.
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;

/// Helper: absolute path to a fixture file.
fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

/// Helper: read a fixture as a string.
fn fixture_contents(name: &str) -> String {
    std::fs::read_to_string(fixture(name)).expect("fixture must exist")
}

// ─────────────────────────────────────────────────────────────────────────────
// schedule
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn schedule_file_prints_progress_and_success_line() {
    Command::cargo_bin("quorum")
        .unwrap()
        .args(["schedule", "-i", &fixture("scenario_a.json")])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "Meeting schedule request: Team Sync 2026-03-16 60min quorum=2",
        ))
        .stdout(predicate::str::contains("P1 accepts 2026-03-16 10:00-11:00"))
        .stdout(predicate::str::contains(
            "Meeting scheduled: [P1, P2] participants agreed on 2026-03-16 10:00-11:00",
        ));
}

#[test]
fn schedule_reads_stdin() {
    Command::cargo_bin("quorum")
        .unwrap()
        .arg("schedule")
        .write_stdin(fixture_contents("scenario_a.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Meeting scheduled:"));
}

#[test]
fn schedule_infeasible_exits_with_code_2() {
    Command::cargo_bin("quorum")
        .unwrap()
        .args(["schedule", "-i", &fixture("scenario_b.json")])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("warning: Unable to find a suitable time"))
        .stdout(predicate::str::contains("Meeting scheduled:").not());
}

#[test]
fn schedule_warns_about_malformed_windows() {
    Command::cargo_bin("quorum")
        .unwrap()
        .args(["schedule", "-i", &fixture("malformed.json")])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "warning: Malformed availability for P1",
        ))
        .stdout(predicate::str::contains(
            "participants agreed on 2026-03-16 11:00-12:00",
        ));
}

#[test]
fn schedule_json_prints_match_result() {
    let output = Command::cargo_bin("quorum")
        .unwrap()
        .args(["schedule", "--json", "-i", &fixture("scenario_a.json")])
        .output()
        .unwrap();

    assert!(output.status.success());
    let result: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout must be a JSON match result");
    assert_eq!(result["accepted"], true);
    assert_eq!(result["slot"]["start"], "10:00");
    assert_eq!(result["slot"]["end"], "11:00");
    assert_eq!(result["attendees"], serde_json::json!(["P1", "P2"]));

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Meeting scheduled:"));
}

#[test]
fn schedule_accepts_timeout_flag_and_env() {
    Command::cargo_bin("quorum")
        .unwrap()
        .args(["schedule", "--timeout-ms", "250", "-i", &fixture("scenario_a.json")])
        .assert()
        .success();

    Command::cargo_bin("quorum")
        .unwrap()
        .env("QUORUM_ROUND_TIMEOUT_MS", "250")
        .args(["schedule", "-i", &fixture("scenario_a.json")])
        .assert()
        .success();
}

#[test]
fn schedule_rejects_invalid_requirement() {
    Command::cargo_bin("quorum")
        .unwrap()
        .args(["schedule", "-i", &fixture("invalid_duration.json")])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to start negotiation"))
        .stderr(predicate::str::contains("duration must be positive"));
}

#[test]
fn schedule_rejects_unparseable_json() {
    Command::cargo_bin("quorum")
        .unwrap()
        .arg("schedule")
        .write_stdin("{ not json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse negotiation request"));
}

#[test]
fn schedule_reports_missing_file() {
    Command::cargo_bin("quorum")
        .unwrap()
        .args(["schedule", "-i", "/nonexistent/request.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read file"));
}

// ─────────────────────────────────────────────────────────────────────────────
// check
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn check_lists_usable_windows() {
    Command::cargo_bin("quorum")
        .unwrap()
        .args(["check", "-i", &fixture("scenario_a.json")])
        .assert()
        .success()
        .stdout(predicate::str::contains("P1: 1 usable window(s) on 2026-03-16"))
        .stdout(predicate::str::contains(
            "Request OK: Team Sync 2026-03-16 60min quorum=2 (3 participants, 3 usable windows)",
        ));
}

#[test]
fn check_reports_malformed_windows() {
    Command::cargo_bin("quorum")
        .unwrap()
        .args(["check", "-i", &fixture("malformed.json")])
        .assert()
        .success()
        .stdout(predicate::str::contains("P1: 1 usable window(s)"))
        .stdout(predicate::str::contains("warning: Malformed availability for P1"));
}

#[test]
fn check_rejects_invalid_requirement() {
    Command::cargo_bin("quorum")
        .unwrap()
        .args(["check", "-i", &fixture("invalid_duration.json")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Meeting requirement is invalid"));
}

// ─────────────────────────────────────────────────────────────────────────────
// General
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("quorum")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("schedule"))
        .stdout(predicate::str::contains("check"));
}
