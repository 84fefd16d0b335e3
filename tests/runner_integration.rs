//! Runner integration tests.
//!
//! These tests spawn real processes and rely on `sh`, `pwd`, `echo` and
//! `sleep`, so most of them only run on Unix.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use command_runner::{
    escape, CommandLogger, CommandRunner, OutputCapture, RunnerError, RunnerState,
};
use tokio_test::{assert_err, assert_ok};

/// Logger that remembers every line it receives.
#[derive(Default)]
struct RecordingLogger {
    lines: Mutex<Vec<String>>,
}

impl CommandLogger for RecordingLogger {
    fn log_command(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }
}

// ============================================================================
// Composition Tests
// ============================================================================

#[test]
fn test_escape_rules() {
    assert_eq!(escape(" "), "\\ ");
    assert_eq!(escape("\\"), "\\\\");
    assert_eq!(escape("'"), "'");
    assert_eq!(escape("a"), "a");
}

#[test]
fn test_shell_mode_display() {
    let mut runner = assert_ok!(CommandRunner::new(["cat", "first second.txt"]));
    assert_ok!(runner.set_shell_mode(true));
    assert_eq!(runner.to_string(), "sh -c cat first\\ second.txt");
}

#[test]
fn test_remote_display() {
    let mut runner = assert_ok!(CommandRunner::new(["cat", "first second.txt"]));
    assert_ok!(runner.set_remote_host(Some("test.colorize.nl".to_string())));
    assert_eq!(
        runner.to_string(),
        "sh -c ssh test.colorize.nl \"cat first\\ second.txt\""
    );
    assert_eq!(runner.composed().argv()[0], "sh");
}

#[test]
fn test_display_has_no_side_effects() {
    let mut runner = assert_ok!(CommandRunner::new(["definitely-not-a-real-binary-42"]));
    assert_ok!(runner.set_shell_mode(true));
    for _ in 0..3 {
        assert_eq!(runner.to_string(), "sh -c definitely-not-a-real-binary-42");
    }
    assert_eq!(runner.state(), RunnerState::Configuring);
    assert!(runner.result().is_none());
}

#[test]
fn test_empty_command_rejected() {
    let err = assert_err!(CommandRunner::new(Vec::<String>::new()));
    assert!(matches!(err, RunnerError::InvalidCommand(_)));
}

// ============================================================================
// Execution Tests
// ============================================================================

#[cfg(unix)]
#[tokio::test]
async fn test_pwd_in_working_directory() {
    let dir = tempfile::tempdir().unwrap();
    let expected = dir.path().canonicalize().unwrap();

    let mut runner = assert_ok!(CommandRunner::new(["pwd"]));
    assert_ok!(runner.set_working_directory(dir.path()));
    assert_ok!(runner.execute().await);

    assert_eq!(runner.state(), RunnerState::Completed);
    assert_eq!(runner.exit_code(), Some(0));
    assert_eq!(
        runner.output().map(str::trim_end),
        Some(expected.to_str().unwrap())
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_shell_mode_redirects() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("redirect.txt");

    let mut runner = assert_ok!(CommandRunner::new([
        "echo",
        "test",
        ">",
        file.to_str().unwrap()
    ]));
    assert_ok!(runner.set_shell_mode(true));
    assert_ok!(runner.execute().await);

    assert_eq!(runner.exit_code(), Some(0));
    assert_eq!(std::fs::read_to_string(&file).unwrap(), "test\n");
}

#[cfg(unix)]
#[tokio::test]
async fn test_direct_mode_does_not_redirect() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("redirect.txt");
    let path = file.to_str().unwrap().to_string();

    let mut runner = assert_ok!(CommandRunner::new(["echo", "test", ">", path.as_str()]));
    assert_ok!(runner.execute().await);

    assert!(!file.exists());
    assert_eq!(runner.output(), Some(format!("test > {}\n", path).as_str()));
}

#[cfg(unix)]
#[tokio::test]
async fn test_shell_mode_preserves_spaces_and_backslashes() {
    let mut runner = assert_ok!(CommandRunner::new(["printf", "%s:%s\\n", "a  b", "c\\d"]));
    assert_ok!(runner.set_shell_mode(true));
    let result = assert_ok!(runner.execute().await);
    assert_eq!(result.output, "a  b:c\\d\n");
}

#[cfg(unix)]
#[tokio::test]
async fn test_non_zero_exit_is_completed() {
    let mut runner = assert_ok!(CommandRunner::new(["sh", "-c", "exit 7"]));
    let result = assert_ok!(runner.execute().await);
    assert_eq!(result.exit_code, 7);
    assert!(!result.success());
    assert_eq!(runner.state(), RunnerState::Completed);
}

#[cfg(unix)]
#[tokio::test]
async fn test_large_output_is_drained() {
    let mut runner = assert_ok!(CommandRunner::new(["sh", "-c", "yes | head -n 100000"]));
    assert_ok!(runner.set_timeout(Some(Duration::from_secs(20))));
    let result = assert_ok!(runner.execute().await);
    assert_eq!(result.output_lines().count(), 100_000);
}

#[tokio::test]
async fn test_spawn_failure() {
    let mut runner = assert_ok!(CommandRunner::new(["definitely-not-a-real-binary-42"]));
    let err = assert_err!(runner.execute().await);
    assert!(matches!(err, RunnerError::Spawn { .. }));
    assert_eq!(runner.state(), RunnerState::Failed);
    assert!(runner.output().is_none());
}

// ============================================================================
// Output Capture Tests
// ============================================================================

#[cfg(unix)]
#[tokio::test]
async fn test_merged_capture() {
    let mut runner = assert_ok!(CommandRunner::new(["sh", "-c", "echo out; echo err >&2"]));
    let result = assert_ok!(runner.execute().await);
    assert_eq!(result.output, "out\nerr\n");
    assert!(result.error_output.is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_merged_capture_keeps_interleaving() {
    for _ in 0..20 {
        let mut runner = assert_ok!(CommandRunner::new([
            "sh",
            "-c",
            "echo a; echo b >&2; echo c; echo d >&2; echo e"
        ]));
        let result = assert_ok!(runner.execute().await);
        assert_eq!(result.output, "a\nb\nc\nd\ne\n");
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_separate_capture() {
    let mut runner = assert_ok!(CommandRunner::new(["sh", "-c", "echo out; echo err >&2"]));
    assert_ok!(runner.set_output_capture(OutputCapture::Separate));
    let result = assert_ok!(runner.execute().await);
    assert_eq!(result.output, "out\n");
    assert_eq!(result.error_output, "err\n");
}

// ============================================================================
// Timeout Tests
// ============================================================================

#[cfg(unix)]
#[tokio::test]
async fn test_timeout_exceeded() {
    let mut runner = assert_ok!(CommandRunner::new(["sleep", "3"]));
    assert_ok!(runner.set_timeout(Some(Duration::from_millis(500))));

    let started = Instant::now();
    let err = assert_err!(runner.execute().await);

    assert!(err.is_timeout());
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(runner.state(), RunnerState::TimedOut);
    assert!(runner.exit_code().is_none());
}

#[cfg(unix)]
#[tokio::test]
async fn test_timeout_override() {
    let mut runner = assert_ok!(CommandRunner::new(["sleep", "3"]));
    let err = assert_err!(runner.execute_with_timeout(Duration::from_millis(300)).await);
    assert!(matches!(err, RunnerError::Timeout(d) if d == Duration::from_millis(300)));
}

#[cfg(unix)]
#[tokio::test]
async fn test_timeout_kills_process_group() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("marker");
    let script = format!("(sleep 1; touch {}) & wait", marker.display());

    let mut runner = assert_ok!(CommandRunner::new(["sh", "-c", script.as_str()]));
    assert_ok!(runner.set_timeout(Some(Duration::from_millis(300))));
    let err = assert_err!(runner.execute().await);
    assert!(err.is_timeout());

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(!marker.exists(), "background child outlived the timeout");
}

#[cfg(unix)]
#[tokio::test]
async fn test_lingering_pipe_holder_respects_deadline() {
    let mut runner = assert_ok!(CommandRunner::new(["sh", "-c", "echo hi; sleep 5 &"]));
    assert_ok!(runner.set_timeout(Some(Duration::from_millis(500))));

    let started = Instant::now();
    let result = assert_ok!(runner.execute().await);

    assert!(started.elapsed() < Duration::from_millis(1500));
    assert_eq!(result.output, "hi\n");
}

#[cfg(unix)]
#[tokio::test]
async fn test_fast_command_within_timeout() {
    let mut runner = assert_ok!(CommandRunner::new(["echo", "fast"]));
    assert_ok!(runner.set_timeout(Some(Duration::from_secs(5))));
    let result = assert_ok!(runner.execute().await);
    assert_eq!(result.output_trimmed(), "fast");
}

// ============================================================================
// Logging Tests
// ============================================================================

#[cfg(unix)]
#[tokio::test]
async fn test_logger_receives_display_string() {
    let logger = Arc::new(RecordingLogger::default());
    let mut runner =
        assert_ok!(CommandRunner::new(["echo", "a b"])).with_shared_logger(logger.clone());
    assert_ok!(runner.set_shell_mode(true));
    assert_ok!(runner.set_logging_enabled(true));

    let display = runner.to_string();
    assert_ok!(runner.execute().await);

    assert_eq!(*logger.lines.lock().unwrap(), vec![display]);
    assert_eq!(runner.output(), Some("a b\n"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_logger_silent_when_disabled() {
    let logger = Arc::new(RecordingLogger::default());
    let mut runner = assert_ok!(CommandRunner::new(["true"])).with_shared_logger(logger.clone());
    assert_ok!(runner.execute().await);
    assert!(logger.lines.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_logger_called_before_spawn_failure() {
    let logger = Arc::new(RecordingLogger::default());
    let mut runner = assert_ok!(CommandRunner::new(["definitely-not-a-real-binary-42"]))
        .with_shared_logger(logger.clone());
    assert_ok!(runner.set_logging_enabled(true));
    let _ = runner.execute().await;
    assert_eq!(
        *logger.lines.lock().unwrap(),
        vec!["definitely-not-a-real-binary-42".to_string()]
    );
}
