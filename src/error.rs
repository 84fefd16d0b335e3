//! Error types for command-runner.

use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;
use crate::runner::RunnerState;

/// Main error type for command-runner operations.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// The argument list is empty or has no program.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// An execution option has an unusable value.
    #[error("invalid option: {0}")]
    InvalidOption(String),

    /// The operating system refused to create the process.
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process outlived its deadline and was killed.
    #[error("command execution timeout after {0:?}")]
    Timeout(Duration),

    /// I/O error while supervising a running process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid state transition attempted.
    #[error("invalid state transition from {from:?} to {to:?}")]
    InvalidStateTransition { from: RunnerState, to: RunnerState },

    /// Runner has already been executed.
    #[error("runner not executable: current state is {0:?}")]
    NotExecutable(RunnerState),

    /// Configuration can only change before execution.
    #[error("runner not configurable: current state is {0:?}")]
    NotConfigurable(RunnerState),

    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl RunnerError {
    /// Whether this error is the timeout failure.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Whether this error means the process never started.
    pub fn is_spawn_failure(&self) -> bool {
        matches!(self, Self::Spawn { .. })
    }
}

/// Convenience Result type for command-runner operations.
pub type Result<T> = std::result::Result<T, RunnerError>;
