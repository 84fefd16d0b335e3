//! Configuration management for command-runner.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file (JSON)
//! 3. Default values

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::execution::{ExecutionOptions, OutputCapture, READER_GRACE_PERIOD};

/// Runner configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Execution defaults.
    pub execution: ExecutionSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Execution configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionSection {
    /// Working directory for commands.
    pub working_directory: Option<PathBuf>,
    /// Run commands through `sh -c`.
    pub shell_mode: bool,
    /// Run commands on this host through `ssh`.
    pub remote_host: Option<String>,
    /// Timeout in milliseconds (none when absent).
    pub timeout_ms: Option<u64>,
    /// Log each command line before running it.
    pub logging_enabled: bool,
    /// Output capture mode.
    pub capture: OutputCapture,
    /// Reader grace period in milliseconds.
    pub reader_grace_ms: u64,
}

impl Default for ExecutionSection {
    fn default() -> Self {
        Self {
            working_directory: None,
            shell_mode: false,
            remote_host: None,
            timeout_ms: None,
            logging_enabled: false,
            capture: OutputCapture::default(),
            reader_grace_ms: READER_GRACE_PERIOD.as_millis() as u64,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl RunnerConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup (for testing).
    pub fn apply_vars<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("COMMAND_RUNNER_REMOTE_HOST") {
            self.execution.remote_host = (!host.is_empty()).then_some(host);
        }

        if let Some(timeout) = lookup("COMMAND_RUNNER_TIMEOUT_MS") {
            let ms = timeout
                .parse()
                .map_err(|_| ConfigError::InvalidValue("COMMAND_RUNNER_TIMEOUT_MS", timeout))?;
            self.execution.timeout_ms = Some(ms);
        }

        if let Some(shell) = lookup("COMMAND_RUNNER_SHELL_MODE") {
            self.execution.shell_mode = match shell.as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => return Err(ConfigError::InvalidValue("COMMAND_RUNNER_SHELL_MODE", shell)),
            };
        }

        if let Some(level) = lookup("COMMAND_RUNNER_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Some(level) = lookup("RUST_LOG") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: env vars > config file > defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => RunnerConfig::from_file(path)?,
            None => RunnerConfig::default(),
        };

        config.apply_env()?;

        Ok(config)
    }

    /// Convert to execution options.
    pub fn to_options(&self) -> Result<ExecutionOptions, ConfigError> {
        let section = &self.execution;
        let mut options = ExecutionOptions::new()
            .shell_mode(section.shell_mode)
            .logging(section.logging_enabled)
            .capture(section.capture);

        if let Some(dir) = &section.working_directory {
            options = options.working_dir(dir);
        }

        if let Some(host) = &section.remote_host {
            options = options.remote_host(host);
        }

        if let Some(ms) = section.timeout_ms {
            if ms == 0 {
                return Err(ConfigError::InvalidValue("timeout_ms", ms.to_string()));
            }
            options = options.timeout(Duration::from_millis(ms));
        }

        Ok(options)
    }

    /// Reader grace period as a duration.
    pub fn reader_grace(&self) -> Duration {
        Duration::from_millis(self.execution.reader_grace_ms)
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// Invalid value for a setting.
    InvalidValue(&'static str, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for {}: '{}'", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
