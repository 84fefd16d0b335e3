//! Single-use command runner.
//!
//! [`CommandRunner`] collects options, composes the command line and
//! runs it once, moving through [`RunnerState`]:
//! `Configuring -> Executing -> {Completed, TimedOut, Failed}`.

mod command_runner;
mod state;

pub use command_runner::CommandRunner;
pub use state::RunnerState;
