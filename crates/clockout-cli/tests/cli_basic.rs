//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a throwaway data directory and
//! verify outputs.

use std::path::Path;
use std::process::Command;

use serde_json::Value;
use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_clockout"))
        .args(args)
        .env("CLOCKOUT_DATA_DIR", dir)
        .env_remove("CLOCKOUT_PLAYER")
        .env_remove("CLOCKOUT_SPEECH_CMD")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_cli_success(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    stdout
}

fn run_json(dir: &Path, args: &[&str]) -> Value {
    let stdout = run_cli_success(dir, args);
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("{args:?} printed non-JSON ({e}): {stdout}"))
}

// ============================================================================
// Shift lifecycle
// ============================================================================

#[test]
fn test_status_of_fresh_install_is_idle() {
    let dir = TempDir::new().unwrap();
    let snap = run_json(dir.path(), &["status", "--json"]);
    assert_eq!(snap["phase"], "idle");
    assert_eq!(snap["status"], "idle");
    assert_eq!(snap["display"], "00:00:00");
}

#[test]
fn test_start_pause_resume_reset() {
    let dir = TempDir::new().unwrap();

    let started = run_json(dir.path(), &["start"]);
    assert_eq!(started["type"], "ShiftStarted");

    let snap = run_json(dir.path(), &["status", "--json"]);
    assert_eq!(snap["phase"], "running");
    assert!(snap["endTime"].is_string());

    let paused = run_json(dir.path(), &["pause"]);
    assert_eq!(paused["type"], "ShiftPaused");
    assert_eq!(paused["phase"], "paused");

    let snap = run_json(dir.path(), &["status", "--json"]);
    assert_eq!(snap["phase"], "paused");

    let resumed = run_json(dir.path(), &["toggle"]);
    assert_eq!(resumed["type"], "ShiftResumed");

    let reset = run_json(dir.path(), &["reset"]);
    assert_eq!(reset["type"], "ShiftReset");
    let snap = run_json(dir.path(), &["status", "--json"]);
    assert_eq!(snap["phase"], "idle");
}

#[test]
fn test_noop_command_prints_snapshot() {
    let dir = TempDir::new().unwrap();
    let snap = run_json(dir.path(), &["pause"]);
    assert_eq!(snap["phase"], "idle");
}

#[test]
fn test_overtime_from_idle() {
    let dir = TempDir::new().unwrap();
    let event = run_json(dir.path(), &["overtime"]);
    assert_eq!(event["type"], "OvertimeStarted");

    let snap = run_json(dir.path(), &["status", "--json"]);
    assert_eq!(snap["phase"], "overtime");
    assert!(snap["display"].as_str().unwrap().starts_with('+'));
}

#[test]
fn test_break_carries_over_between_invocations() {
    let dir = TempDir::new().unwrap();
    run_cli_success(dir.path(), &["start"]);

    let started = run_json(dir.path(), &["break", "start"]);
    assert_eq!(started["type"], "BreakStarted");

    let snap = run_json(dir.path(), &["status", "--json"]);
    assert_eq!(snap["phase"], "onBreak");
    assert_eq!(snap["status"], "onBreak");
    assert!(snap["breakRemainingSeconds"].as_u64().unwrap() <= 5 * 60);

    let ended = run_json(dir.path(), &["break", "end"]);
    assert_eq!(ended["type"], "BreakEnded");
    assert_eq!(ended["early"], true);

    let snap = run_json(dir.path(), &["status", "--json"]);
    assert_eq!(snap["phase"], "running");
}

#[test]
fn test_status_human_line() {
    let dir = TempDir::new().unwrap();
    let stdout = run_cli_success(dir.path(), &["status"]);
    assert!(stdout.starts_with("Idle"));
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_set_and_get() {
    let dir = TempDir::new().unwrap();
    let stdout = run_cli_success(dir.path(), &["config", "set", "workHours", "7"]);
    assert_eq!(stdout.trim(), "ok");

    let stdout = run_cli_success(dir.path(), &["config", "get", "workHours"]);
    assert_eq!(stdout.trim(), "7.0");

    let stdout = run_cli_success(dir.path(), &["config", "get", "notifyMethod"]);
    assert_eq!(stdout.trim(), "all");
}

#[test]
fn test_config_rejects_unknown_key_and_bad_value() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["config", "set", "theme", "dark"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("error:"));

    let (_, stderr, code) = run_cli(dir.path(), &["config", "set", "lunchTime", "noon"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("lunchTime"));

    let stdout = run_cli_success(dir.path(), &["config", "get", "lunchTime"]);
    assert_eq!(stdout.trim(), "12:00");
}

#[test]
fn test_setting_start_time_while_idle_starts_the_shift() {
    let dir = TempDir::new().unwrap();
    let event = run_json(dir.path(), &["config", "set", "startWorkTime", "09:00"]);
    assert_eq!(event["type"], "ShiftStarted");
}

#[test]
fn test_reset_forgets_start_time() {
    let dir = TempDir::new().unwrap();
    run_cli_success(dir.path(), &["config", "set", "startWorkTime", "09:00"]);
    run_cli_success(dir.path(), &["reset"]);
    let stdout = run_cli_success(dir.path(), &["config", "get", "startWorkTime"]);
    assert_eq!(stdout.trim(), "");
}

#[test]
fn test_config_list_and_path() {
    let dir = TempDir::new().unwrap();
    let config = run_json(dir.path(), &["config", "list"]);
    assert_eq!(config["lunchBreak"], 90);
    assert_eq!(config["breakInterval"], 60);

    let stdout = run_cli_success(dir.path(), &["config", "path"]);
    assert_eq!(Path::new(stdout.trim()), dir.path());
}

// ============================================================================
// Reminders
// ============================================================================

#[test]
fn test_reminder_add_list_remove() {
    let dir = TempDir::new().unwrap();
    let id = run_cli_success(dir.path(), &["reminder", "add", "15:00", "Stand-up", "--content", "Room 4"]);
    let id = id.trim().to_string();
    assert!(id.starts_with("reminder_"));

    let list = run_json(dir.path(), &["reminder", "list", "--json"]);
    let reminders = list.as_array().unwrap();
    assert_eq!(reminders.len(), 1);
    assert_eq!(reminders[0]["title"], "Stand-up");
    assert_eq!(reminders[0]["repeat"], true);

    run_cli_success(dir.path(), &["reminder", "disable", &id]);
    let list = run_json(dir.path(), &["reminder", "list", "--json"]);
    assert_eq!(list[0]["enabled"], false);

    run_cli_success(dir.path(), &["reminder", "edit", &id, "--time", "16:30"]);
    let list = run_json(dir.path(), &["reminder", "list", "--json"]);
    assert_eq!(list[0]["time"], "16:30");

    run_cli_success(dir.path(), &["reminder", "remove", &id]);
    let (_, stderr, code) = run_cli(dir.path(), &["reminder", "remove", &id]);
    assert_ne!(code, 0);
    assert!(stderr.contains(&id));
}

#[test]
fn test_reminder_rejects_bad_input() {
    let dir = TempDir::new().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["reminder", "add", "25:00", "Late"]);
    assert_ne!(code, 0);
    let (_, _, code) = run_cli(dir.path(), &["reminder", "add", "10:00", "  "]);
    assert_ne!(code, 0);

    let list = run_json(dir.path(), &["reminder", "list", "--json"]);
    assert_eq!(list.as_array().unwrap().len(), 0);
}

#[test]
fn test_reminder_test_delivers() {
    let dir = TempDir::new().unwrap();
    run_cli_success(dir.path(), &["reminder", "add", "15:00", "Tea"]);
    let stdout = run_cli_success(dir.path(), &["reminder", "test"]);
    assert!(stdout.contains("delivered: desktop"));
}

// ============================================================================
// Notifications and sound
// ============================================================================

#[test]
fn test_notify_lunch_reports_channels() {
    let dir = TempDir::new().unwrap();
    let stdout = run_cli_success(dir.path(), &["notify", "lunch"]);
    assert_eq!(stdout.trim(), "delivered: desktop, tone, flash");
}

#[test]
fn test_speech_needs_a_helper() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["notify", "speak", "hello"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("CLOCKOUT_SPEECH_CMD"));
}

#[cfg(unix)]
#[test]
fn test_speech_runs_the_helper() {
    let dir = TempDir::new().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_clockout"))
        .args(["notify", "speak", "hello"])
        .env("CLOCKOUT_DATA_DIR", dir.path())
        .env("CLOCKOUT_SPEECH_CMD", "true")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "ok");
}

#[test]
fn test_custom_sound_validation() {
    let dir = TempDir::new().unwrap();

    let text = dir.path().join("notes.txt");
    std::fs::write(&text, b"not audio").unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["sound", "set", text.to_str().unwrap()]);
    assert_ne!(code, 0);
    assert!(stderr.contains("not an audio file"));

    let wav = dir.path().join("gong.wav");
    std::fs::write(&wav, b"RIFF").unwrap();
    run_cli_success(dir.path(), &["sound", "set", wav.to_str().unwrap()]);
    let stdout = run_cli_success(dir.path(), &["config", "get", "soundType"]);
    assert_eq!(stdout.trim(), "custom");

    // No player configured, so the clip falls back to the bell.
    let stdout = run_cli_success(dir.path(), &["sound", "play"]);
    assert_eq!(stdout.trim(), "delivered: tone");

    run_cli_success(dir.path(), &["sound", "clear"]);
    let stdout = run_cli_success(dir.path(), &["config", "get", "soundType"]);
    assert_eq!(stdout.trim(), "beep");
}

// ============================================================================
// Misc
// ============================================================================

#[test]
fn test_end_soon_requires_dev_mode() {
    let dir = TempDir::new().unwrap();
    run_cli_success(dir.path(), &["start"]);
    let (_, stderr, code) = run_cli(dir.path(), &["dev", "end-soon"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("developer mode"));

    run_cli_success(dir.path(), &["config", "set", "enableDevMode", "true"]);
    let event = run_json(dir.path(), &["dev", "end-soon"]);
    assert_eq!(event["type"], "BoundariesRecalculated");
}

#[test]
fn test_completions() {
    let dir = TempDir::new().unwrap();
    let stdout = run_cli_success(dir.path(), &["completions", "bash"]);
    assert!(stdout.contains("clockout"));
}
