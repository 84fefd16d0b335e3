//! # command-runner
//!
//! Run external commands directly, through `sh`, or on a remote host over
//! `ssh`, with concurrent output capture and hard timeouts.
//!
//! Commands run in one of three modes:
//!
//! - **Direct**: the argument list goes to the program verbatim.
//! - **Shell**: tokens are escaped and joined, then run as `sh -c <line>`,
//!   so redirection and pipes take effect.
//! - **Remote**: the shell line is double-quoted and passed to
//!   `ssh <host>`, itself run through `sh -c`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use command_runner::CommandRunner;
//!
//! #[tokio::main]
//! async fn main() -> command_runner::Result<()> {
//!     // Initialize logging
//!     command_runner::logging::try_init().ok();
//!
//!     let mut runner = CommandRunner::new(["echo", "test", ">", "out.txt"])?;
//!     runner.set_shell_mode(true)?;
//!     runner.set_timeout(Some(Duration::from_secs(5)))?;
//!     runner.set_logging_enabled(true)?;
//!
//!     println!("running {}", runner);
//!     let result = runner.execute().await?;
//!     println!("exit code {}", result.exit_code);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod execution;
pub mod logging;
pub mod runner;

// Re-export commonly used types
pub use config::{ConfigError, RunnerConfig};
pub use error::{Result, RunnerError};
pub use execution::{
    compose, escape, ComposedCommand, Command, ExecutionOptions, ExecutionResult, OutputCapture,
    ProcessExecutor,
};
pub use logging::{CommandLogger, TracingLogger};
pub use runner::{CommandRunner, RunnerState};
