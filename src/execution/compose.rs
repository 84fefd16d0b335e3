//! Turning a command and its options into the argv handed to the OS.

use std::fmt;

use super::command::{Command, ExecutionOptions};
use super::quote::escape_all;

/// Shell used for shell and remote mode.
pub const SHELL_PROGRAM: &str = "sh";

/// Client used for remote mode.
pub const SSH_PROGRAM: &str = "ssh";

/// How a composed command reaches the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// Tokens go to the program verbatim.
    Direct,
    /// `sh -c <escaped line>`.
    Shell,
    /// `sh -c 'ssh <host> "<escaped line>"'`.
    Remote,
}

/// The final argv plus its human-readable rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedCommand {
    /// Executable passed to the spawn call.
    pub program: String,
    /// Arguments passed to the spawn call.
    pub args: Vec<String>,
    /// Space-joined reconstruction of the command line.
    pub display: String,
    /// Mode the command was composed in.
    pub mode: LaunchMode,
}

impl ComposedCommand {
    /// The full argv, program first.
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }

    fn through_shell(line: String, mode: LaunchMode) -> Self {
        Self {
            display: format!("{} -c {}", SHELL_PROGRAM, line),
            program: SHELL_PROGRAM.to_string(),
            args: vec!["-c".to_string(), line],
            mode,
        }
    }
}

impl fmt::Display for ComposedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

/// Compose the argv for `command` under `options`.
///
/// Depends only on configuration, so it can be called before, after, or
/// instead of execution with identical results.
pub fn compose(command: &Command, options: &ExecutionOptions) -> ComposedCommand {
    if let Some(host) = &options.remote_host {
        let inner = escape_all(command.args());
        let outer = format!("{} {} \"{}\"", SSH_PROGRAM, host, inner);
        return ComposedCommand::through_shell(outer, LaunchMode::Remote);
    }

    if options.shell_mode {
        return ComposedCommand::through_shell(escape_all(command.args()), LaunchMode::Shell);
    }

    ComposedCommand {
        program: command.program().to_string(),
        args: command.arguments().to_vec(),
        display: command.args().join(" "),
        mode: LaunchMode::Direct,
    }
}
