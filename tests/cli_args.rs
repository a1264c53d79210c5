//! Integration tests for the schedbot binary
//!
//! Runs the binary in an empty temporary directory so that no `.env` file
//! leaks into the tests, and points it at an unreachable API.

use std::io::Write;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

/// An address nothing listens on
const UNREACHABLE_API: &str = "http://127.0.0.1:9/api/student/GetGroupSchedule";

fn schedbot(dir: &TempDir) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_schedbot"));
    command
        .current_dir(dir.path())
        .env_remove("RUST_LOG")
        .env("SCHEDBOT_API_URL", UNREACHABLE_API)
        .env("SCHEDBOT_TIMEOUT_SECS", "2");
    command
}

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> Output {
    let dir = TempDir::new().expect("Failed to create temp directory");
    schedbot(&dir)
        .args(args)
        .output()
        .expect("Failed to execute schedbot")
}

/// Runs the chat loop with the given stdin contents
fn run_chat(input: &str) -> Output {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let mut child = schedbot(&dir)
        .arg("chat")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn schedbot");

    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(input.as_bytes())
        .expect("Failed to write stdin");

    child.wait_with_output().expect("Failed to wait for schedbot")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(
        output.status.success(),
        "Expected --help to exit successfully"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("schedbot"), "Help should mention schedbot");
    assert!(stdout.contains("show"), "Help should mention the show command");
    assert!(stdout.contains("--group-id"), "Help should mention --group-id");
}

#[test]
fn test_invalid_day_prints_error_and_exits() {
    let output = run_cli(&["show", "sunday"]);
    assert!(!output.status.success(), "Expected invalid day to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("InvalidDay") || stderr.contains("Invalid day"),
        "Should print error message about invalid day: {}",
        stderr
    );
}

#[test]
fn test_zero_stale_retry_is_rejected() {
    let output = run_cli(&["--stale-retry-secs", "0", "week"]);
    assert!(!output.status.success(), "Expected a zero retry window to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("--stale-retry-secs"),
        "Should name the rejected option: {}",
        stderr
    );
}

#[test]
fn test_show_fails_when_api_is_unreachable() {
    let output = run_cli(&["show", "mon"]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty(), "No schedule should be printed");
}

#[test]
fn test_week_prints_header_and_menu_offline() {
    let output = run_cli(&["week"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Текущая неделя"));
    assert!(stdout.contains("Выберите день:"));
    assert!(stdout.contains("[ Понедельник ] [ Вторник ]"));
    assert!(stdout.contains("[ Следующая неделя ]"));
}

#[test]
fn test_week_next_prints_starred_menu() {
    let output = run_cli(&["week", "--next"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Следующая неделя"));
    assert!(stdout.contains("[ Понедельник* ]"));
    assert!(stdout.contains("[ Текущая неделя ]"));
}

#[test]
fn test_chat_answers_start_and_skips_failed_requests() {
    let output = run_chat("/start\nПонедельник\nпривет\n");
    assert!(output.status.success(), "Chat should end cleanly on EOF");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Выберите день:"), "Start should be answered");
    assert!(
        !stdout.contains("Расписание на"),
        "Day request should get no reply while the API is down"
    );
    assert!(stdout.contains("привет"), "Unknown text should be echoed");

    // Replies keep message order
    let start = stdout.find("Выберите день:").unwrap();
    let echo = stdout.find("привет").unwrap();
    assert!(start < echo);
}
