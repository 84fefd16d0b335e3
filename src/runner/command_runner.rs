//! The command runner facade.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use super::RunnerState;
use crate::config::RunnerConfig;
use crate::error::RunnerError;
use crate::execution::{
    compose, Command, ComposedCommand, ExecutionOptions, ExecutionResult, OutputCapture,
    ProcessExecutor,
};
use crate::logging::{CommandLogger, TracingLogger};
use crate::Result;

/// Configures, runs and reports on a single command.
///
/// A runner is single-use: options can change while it is
/// [`Configuring`](RunnerState::Configuring), and `execute` moves it to a
/// terminal state. Results are only available once it has
/// [`Completed`](RunnerState::Completed).
pub struct CommandRunner {
    command: Command,
    options: ExecutionOptions,
    state: RunnerState,
    result: Option<ExecutionResult>,
    executor: ProcessExecutor,
    logger: Arc<dyn CommandLogger>,
}

impl CommandRunner {
    /// Create a runner for an argument list with default options.
    ///
    /// Fails with [`RunnerError::InvalidCommand`] for an empty list.
    pub fn new<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self::from_command(Command::new(args)?, ExecutionOptions::new()))
    }

    /// Create a runner from a command and options.
    pub fn from_command(command: Command, options: ExecutionOptions) -> Self {
        Self {
            command,
            options,
            state: RunnerState::Configuring,
            result: None,
            executor: ProcessExecutor::new(),
            logger: Arc::new(TracingLogger),
        }
    }

    /// Create a runner whose options come from a loaded configuration.
    pub fn from_config<I, S>(args: I, config: &RunnerConfig) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut runner = Self::from_command(Command::new(args)?, config.to_options()?);
        runner.executor = ProcessExecutor::new().with_reader_grace(config.reader_grace());
        Ok(runner)
    }

    /// Replace the command logger.
    pub fn with_logger(mut self, logger: impl CommandLogger + 'static) -> Self {
        self.logger = Arc::new(logger);
        self
    }

    /// Use a shared command logger.
    pub fn with_shared_logger(mut self, logger: Arc<dyn CommandLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Set the working directory.
    pub fn set_working_directory(&mut self, dir: impl Into<PathBuf>) -> Result<()> {
        let dir = dir.into();
        self.configure(|options| options.working_dir(dir))
    }

    /// Enable or disable shell mode.
    pub fn set_shell_mode(&mut self, enabled: bool) -> Result<()> {
        self.configure(|options| options.shell_mode(enabled))
    }

    /// Run on a remote host over ssh, or locally again with `None`.
    pub fn set_remote_host(&mut self, host: Option<String>) -> Result<()> {
        self.configure(|mut options| {
            options.remote_host = host;
            options
        })
    }

    /// Set or clear the execution timeout.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.configure(|mut options| {
            options.timeout = timeout;
            options
        })
    }

    /// Enable or disable command logging.
    pub fn set_logging_enabled(&mut self, enabled: bool) -> Result<()> {
        self.configure(|options| options.logging(enabled))
    }

    /// Set the output capture mode.
    pub fn set_output_capture(&mut self, capture: OutputCapture) -> Result<()> {
        self.configure(|options| options.capture(capture))
    }

    fn configure<F>(&mut self, update: F) -> Result<()>
    where
        F: FnOnce(ExecutionOptions) -> ExecutionOptions,
    {
        if !self.state.can_configure() {
            return Err(RunnerError::NotConfigurable(self.state));
        }
        self.options = update(std::mem::take(&mut self.options));
        Ok(())
    }

    /// The command being run.
    pub fn command(&self) -> &Command {
        &self.command
    }

    /// The current options.
    pub fn options(&self) -> &ExecutionOptions {
        &self.options
    }

    /// The current lifecycle state.
    pub fn state(&self) -> RunnerState {
        self.state
    }

    /// The command as it will be handed to the OS.
    pub fn composed(&self) -> ComposedCommand {
        compose(&self.command, &self.options)
    }

    /// Run the command with the configured options.
    ///
    /// Non-zero exit codes are returned as data. Fails with
    /// [`RunnerError::Spawn`] if the process cannot start and
    /// [`RunnerError::Timeout`] if it was killed at its deadline.
    pub async fn execute(&mut self) -> Result<&ExecutionResult> {
        let options = self.options.clone();
        self.run(options).await
    }

    /// Run the command with `timeout` in place of the configured one.
    pub async fn execute_with_timeout(&mut self, timeout: Duration) -> Result<&ExecutionResult> {
        let options = self.options.clone().timeout(timeout);
        self.run(options).await
    }

    /// Run the command on a private current-thread runtime.
    ///
    /// # Panics
    ///
    /// Panics if called from within an async runtime.
    pub fn execute_blocking(&mut self) -> Result<&ExecutionResult> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.execute())
    }

    async fn run(&mut self, options: ExecutionOptions) -> Result<&ExecutionResult> {
        if !self.state.can_configure() {
            return Err(RunnerError::NotExecutable(self.state));
        }
        options.validate()?;

        let started = Instant::now();
        self.state.transition_to(RunnerState::Executing)?;

        let composed = compose(&self.command, &options);
        if options.logging {
            self.logger.log_command(&composed.display);
        }

        match self.executor.run_from(started, &composed, &options).await {
            Ok(result) => {
                self.state.transition_to(RunnerState::Completed)?;
                debug!(exit_code = result.exit_code, duration = ?result.duration, "command completed");
                Ok(&*self.result.insert(result))
            }
            Err(e) => {
                let next = if e.is_timeout() {
                    RunnerState::TimedOut
                } else {
                    RunnerState::Failed
                };
                self.state.transition_to(next)?;
                Err(e)
            }
        }
    }

    /// Exit code, once completed.
    pub fn exit_code(&self) -> Option<i32> {
        self.result.as_ref().map(|r| r.exit_code)
    }

    /// Captured output, once completed.
    pub fn output(&self) -> Option<&str> {
        self.result.as_ref().map(|r| r.output.as_str())
    }

    /// Full execution result, once completed.
    pub fn result(&self) -> Option<&ExecutionResult> {
        self.result.as_ref()
    }
}

impl fmt::Display for CommandRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.composed(), f)
    }
}

impl fmt::Debug for CommandRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRunner")
            .field("command", &self.command)
            .field("options", &self.options)
            .field("state", &self.state)
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}
