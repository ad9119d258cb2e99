//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a throwaway data directory and
//! verify its JSON output.

use std::path::Path;
use std::process::Command;

use serde_json::Value;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(data_dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_quizfunnel-cli"))
        .args(args)
        .env("QUIZFUNNEL_DATA_DIR", data_dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

/// Like [`run_cli`] with tracked events logged to stderr.
fn run_cli_logged(data_dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_quizfunnel-cli"))
        .args(args)
        .env("QUIZFUNNEL_DATA_DIR", data_dir)
        .env("RUST_LOG", "info")
        .output()
        .expect("Failed to execute CLI command");

    (
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

fn run_json(data_dir: &Path, args: &[&str]) -> Value {
    let (code, stdout, stderr) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("stdout is not JSON")
}

#[test]
fn test_quiz_status_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let status = run_json(dir.path(), &["quiz", "status"]);
    assert_eq!(status["phase"]["phase"], "intro");
    assert_eq!(status["current_step"], 0);
    assert_eq!(status["answers"], serde_json::json!({}));
}

#[test]
fn test_quiz_answer_auto_advances() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["quiz", "start"]);
    let out = run_json(dir.path(), &["quiz", "answer", "main_challenge", "no_time"]);
    assert_eq!(out["state"]["current_step"], 2);
    assert_eq!(out["state"]["answers"]["main_challenge"], "no_time");

    // Persisted between invocations.
    let status = run_json(dir.path(), &["quiz", "status"]);
    assert_eq!(status["current_step"], 2);
    assert_eq!(status["question"]["id"], "symptoms");
}

#[test]
fn test_quiz_answer_off_screen_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["quiz", "answer", "symptoms", "fatigue"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("not an option"));
}

#[test]
fn test_quiz_back_disabled_by_default() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["quiz", "start"]);
    run_json(dir.path(), &["quiz", "next"]);
    let out = run_json(dir.path(), &["quiz", "back"]);
    assert_eq!(out["state"]["current_step"], 2);
    assert_eq!(out["events"], serde_json::json!([]));
}

#[test]
fn test_quiz_reset() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["quiz", "start"]);
    let out = run_json(dir.path(), &["quiz", "reset"]);
    assert_eq!(out["state"]["current_step"], 0);
}

#[test]
fn test_countdown_status_and_reset() {
    let dir = tempfile::tempdir().unwrap();
    let first = run_json(dir.path(), &["countdown", "status"]);
    let second = run_json(dir.path(), &["countdown", "status"]);
    assert_eq!(first["start_ms"], second["start_ms"]);
    assert_eq!(first["duration_ms"], 1_200_000);
    assert_eq!(first["expired"], false);

    let reset = run_json(dir.path(), &["countdown", "reset"]);
    assert!(reset["start_ms"].as_u64() >= first["start_ms"].as_u64());
}

#[test]
fn test_reveal_check() {
    let dir = tempfile::tempdir().unwrap();
    let closed = run_json(dir.path(), &["reveal", "check", "--watched", "10"]);
    assert_eq!(closed["revealed"], false);
    let open = run_json(dir.path(), &["reveal", "check", "--watched", "230"]);
    assert_eq!(open["revealed"], true);
}

#[test]
fn test_reveal_banner() {
    let dir = tempfile::tempdir().unwrap();
    let banner = run_json(dir.path(), &["reveal", "banner", "--watched", "60"]);
    assert_eq!(banner["progress_pct"], 70.0);
    assert_eq!(banner["stage"], "discoveries");
}

#[test]
fn test_config_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["config", "get", "reveal.threshold_secs"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "230.0");

    let (code, _, _) = run_cli(dir.path(), &["config", "set", "reveal.threshold_secs", "170"]);
    assert_eq!(code, 0);
    let check = run_json(dir.path(), &["reveal", "check", "--watched", "170"]);
    assert_eq!(check["revealed"], true);

    let (code, _, stderr) = run_cli(dir.path(), &["config", "get", "nope"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_config_rejects_out_of_range_delay() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(dir.path(), &["config", "set", "quiz.auto_advance_delay_ms", "2000"]);
    assert_ne!(code, 0);
    let list = run_json(dir.path(), &["config", "list"]);
    assert_eq!(list["config"]["quiz"]["auto_advance_delay_ms"], 500);
}

#[test]
fn test_config_check_reports_hand_edited_values() {
    let dir = tempfile::tempdir().unwrap();
    let check = run_json(dir.path(), &["config", "check"]);
    assert_eq!(check["valid"], true);
    assert_eq!(check["reveal_source"], "video");

    let path = dir.path().join("config.toml");
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("auto_advance_delay_ms = 500"));
    std::fs::write(
        &path,
        content.replace("auto_advance_delay_ms = 500", "auto_advance_delay_ms = 2000"),
    )
    .unwrap();

    let (code, stdout, _) = run_cli(dir.path(), &["config", "check"]);
    assert_ne!(code, 0);
    let check: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(check["valid"], false);
    assert!(check["error"]
        .as_str()
        .unwrap()
        .contains("quiz.auto_advance_delay_ms"));
}

#[test]
fn test_config_set_reports_previous_value() {
    let dir = tempfile::tempdir().unwrap();
    let set = run_json(dir.path(), &["config", "set", "quiz.allow_back", "true"]);
    assert_eq!(set["previous"], "false");
    assert_eq!(set["value"], "true");
}

#[test]
fn test_quiz_status_tracks_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli_logged(dir.path(), &["quiz", "status"]);
    assert_eq!(code, 0);
    assert!(!stderr.contains("Page View"), "{stderr}");

    let (code, _, stderr) = run_cli_logged(dir.path(), &["quiz", "start"]);
    assert_eq!(code, 0);
    assert!(stderr.contains("Page View"), "{stderr}");
}
