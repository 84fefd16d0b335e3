//! Command and execution option types.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::RunnerError;
use crate::Result;

/// An external command: the program followed by its arguments.
///
/// A command always holds at least one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    args: Vec<String>,
}

impl Command {
    /// Create a command from its argument list.
    ///
    /// Fails with [`RunnerError::InvalidCommand`] when the list is empty
    /// or the program token is empty.
    pub fn new<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        match args.first() {
            None => Err(RunnerError::InvalidCommand("empty argument list".into())),
            Some(program) if program.is_empty() => {
                Err(RunnerError::InvalidCommand("empty program name".into()))
            }
            Some(_) => Ok(Self { args }),
        }
    }

    /// The executable, `argv[0]`.
    pub fn program(&self) -> &str {
        &self.args[0]
    }

    /// Arguments after the program.
    pub fn arguments(&self) -> &[String] {
        &self.args[1..]
    }

    /// All tokens, program included.
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// Which process streams end up in the captured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputCapture {
    /// Stdout and stderr share one buffer, in arrival order.
    #[default]
    Merged,
    /// Stdout goes to `output`, stderr to `error_output`.
    Separate,
    /// Only stdout is captured; stderr is inherited.
    StdoutOnly,
}

impl OutputCapture {
    /// Whether stderr is piped at all.
    pub fn captures_stderr(&self) -> bool {
        !matches!(self, OutputCapture::StdoutOnly)
    }
}

/// How a command should be executed.
///
/// Options are an immutable value; each setter returns a new value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionOptions {
    /// Working directory (current directory if unset).
    pub working_dir: Option<PathBuf>,
    /// Run through `sh -c`.
    pub shell_mode: bool,
    /// Host to run on through `ssh`.
    pub remote_host: Option<String>,
    /// Hard deadline for the whole execution.
    pub timeout: Option<Duration>,
    /// Hand the display string to the command logger before spawning.
    pub logging: bool,
    /// Output capture mode.
    pub capture: OutputCapture,
}

impl ExecutionOptions {
    /// Create default options: direct mode, no timeout, no logging.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the working directory.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Enable or disable shell mode.
    pub fn shell_mode(mut self, enabled: bool) -> Self {
        self.shell_mode = enabled;
        self
    }

    /// Run on a remote host over ssh.
    pub fn remote_host(mut self, host: impl Into<String>) -> Self {
        self.remote_host = Some(host.into());
        self
    }

    /// Set the execution timeout.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Enable or disable command logging.
    pub fn logging(mut self, enabled: bool) -> Self {
        self.logging = enabled;
        self
    }

    /// Set the output capture mode.
    pub fn capture(mut self, capture: OutputCapture) -> Self {
        self.capture = capture;
        self
    }

    /// Whether the effective execution goes through a local shell.
    ///
    /// A remote host always implies a shell layer.
    pub fn uses_shell(&self) -> bool {
        self.shell_mode || self.remote_host.is_some()
    }

    /// The working directory, if any.
    pub fn working_dir_path(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    /// Reject values that can never execute.
    pub fn validate(&self) -> Result<()> {
        if self.timeout == Some(Duration::ZERO) {
            return Err(RunnerError::InvalidOption("timeout must be positive".into()));
        }
        if let Some(host) = &self.remote_host {
            if host.trim().is_empty() {
                return Err(RunnerError::InvalidOption("remote host is empty".into()));
            }
        }
        Ok(())
    }
}
