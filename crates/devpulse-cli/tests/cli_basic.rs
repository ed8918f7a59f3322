//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run against a temp data directory.

use std::process::Command;

/// Run a CLI command with an isolated data dir and return output.
fn run_cli(data_dir: &std::path::Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "devpulse-cli", "--quiet", "--"])
        .args(args)
        .env("DEVPULSE_DATA_DIR", data_dir)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_help() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["--help"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("DevPulse CLI"));
    assert!(stdout.contains("sync"));
}

#[test]
fn test_config_path_honors_data_dir_override() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "path"]);
    assert_eq!(code, 0);
    assert!(stdout.contains(dir.path().to_str().unwrap()));
}

#[test]
fn test_sync_run_then_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let activity = dir.path().join("activity.json");
    std::fs::write(
        &activity,
        r#"[
            {"date": "2026-08-03", "commits": 6, "prs_merged": 1, "coding_minutes": 120},
            {"date": "2026-08-04", "commits": 3, "coding_minutes": 90}
        ]"#,
    )
    .unwrap();

    let (stdout, stderr, code) = run_cli(
        dir.path(),
        &[
            "sync",
            "run",
            "--user",
            "mira",
            "--file",
            activity.to_str().unwrap(),
        ],
    );
    assert_eq!(code, 0, "sync failed: {stderr}");

    let summary: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(summary["date"], "2026-08-04");
    assert_eq!(summary["streak"]["current"], 1);

    let (stdout, _, code) = run_cli(
        dir.path(),
        &["score", "today", "--user", "mira", "--date", "2026-08-04"],
    );
    assert_eq!(code, 0);
    let snapshot: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(snapshot["date"], "2026-08-04");

    let (stdout, _, code) = run_cli(
        dir.path(),
        &["verdict", "today", "--user", "mira", "--date", "2026-08-04"],
    );
    assert_eq!(code, 0);
    assert!(stdout.contains("\"key\""));

    let (stdout, _, code) = run_cli(dir.path(), &["xp", "level", "--user", "mira"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("\"level\""));
}

#[test]
fn test_streak_freeze_without_balance_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["streak", "freeze", "--user", "mira"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("No freeze days available"));
}
