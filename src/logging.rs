//! Logging initialization and the command logging sink.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "command_runner=info";

/// Receives the display string of each command before it is spawned.
pub trait CommandLogger: Send + Sync {
    /// Record one command line.
    fn log_command(&self, line: &str);
}

impl<F> CommandLogger for F
where
    F: Fn(&str) + Send + Sync,
{
    fn log_command(&self, line: &str) {
        self(line)
    }
}

/// Logs commands through `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl CommandLogger for TracingLogger {
    fn log_command(&self, line: &str) {
        tracing::info!(target: "command_runner::command", "{}", line);
    }
}

/// Initialize the logging system.
///
/// Uses the `RUST_LOG` environment variable for filtering. If not set,
/// defaults to `command_runner=info`.
///
/// # Panics
///
/// Panics if called more than once, or if another tracing subscriber
/// has already been set.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact())
        .init();
}

/// Try to initialize the logging system.
///
/// Returns `Ok(())` if successful, or `Err` if logging has already been
/// initialized.
pub fn try_init() -> Result<(), tracing_subscriber::util::TryInitError> {
    try_init_with_filter(None)
}

/// Try to initialize logging with an explicit filter, e.g. from
/// [`RunnerConfig::log_filter`](crate::config::RunnerConfig::log_filter).
///
/// An invalid or missing filter falls back to `RUST_LOG`, then the default.
pub fn try_init_with_filter(
    filter: Option<&str>,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = filter
        .and_then(|f| EnvFilter::try_new(f).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact())
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_try_init_idempotent() {
        // First call may or may not succeed depending on test order
        let _ = try_init();
        let _ = try_init_with_filter(Some("command_runner=debug"));
        // Either way, we shouldn't panic
    }

    #[test]
    fn test_tracing_logger_does_not_panic() {
        let _ = try_init();
        TracingLogger.log_command("sh -c echo hello");
    }

    #[test]
    fn test_closure_logger() {
        let lines = Mutex::new(Vec::new());
        let logger = |line: &str| lines.lock().unwrap().push(line.to_string());
        logger.log_command("ls -la");
        assert_eq!(*lines.lock().unwrap(), vec!["ls -la".to_string()]);
    }
}
