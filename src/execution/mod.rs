//! Command execution engine.
//!
//! This module provides the execution pipeline:
//! - Single-layer token escaping
//! - Composition of direct, shell and remote command lines
//! - Process spawning with concurrent output draining and hard timeouts
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use command_runner::execution::{compose, execute, Command, ExecutionOptions};
//!
//! # async fn run() -> command_runner::Result<()> {
//! let command = Command::new(["cat", "first second.txt"])?;
//! let options = ExecutionOptions::new()
//!     .shell_mode(true)
//!     .timeout(Duration::from_secs(10));
//!
//! assert_eq!(
//!     compose(&command, &options).to_string(),
//!     "sh -c cat first\\ second.txt"
//! );
//!
//! let result = execute(&command, &options).await?;
//! println!("exit {}: {}", result.exit_code, result.output);
//! # Ok(())
//! # }
//! ```

mod command;
mod compose;
mod executor;
pub mod quote;
mod result;

pub use command::{Command, ExecutionOptions, OutputCapture};
pub use compose::{compose, ComposedCommand, LaunchMode, SHELL_PROGRAM, SSH_PROGRAM};
pub use executor::{execute, execute_with_timeout, ProcessExecutor, READER_GRACE_PERIOD};
pub use quote::{escape, escape_all};
pub use result::{ExecutionResult, OutputChunk, OutputSource};
