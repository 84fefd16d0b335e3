//! Execution result types.

use std::time::Duration;

use super::command::OutputCapture;

/// Result of a command that ran to completion.
///
/// A non-zero exit code is still a completed execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Exit code of the process.
    pub exit_code: i32,
    /// Captured output, decoded as UTF-8.
    pub output: String,
    /// Captured stderr when capturing streams separately.
    pub error_output: String,
    /// Raw bytes behind `output`.
    pub raw_output: Vec<u8>,
    /// Wall-clock execution time.
    pub duration: Duration,
}

impl ExecutionResult {
    /// Create a new execution result.
    pub fn new(exit_code: i32, raw_output: Vec<u8>, duration: Duration) -> Self {
        let output = String::from_utf8_lossy(&raw_output).into_owned();
        Self {
            exit_code,
            output,
            error_output: String::new(),
            raw_output,
            duration,
        }
    }

    /// Attach separately captured stderr.
    pub fn with_error_output(mut self, raw: &[u8]) -> Self {
        self.error_output = String::from_utf8_lossy(raw).into_owned();
        self
    }

    /// Check if command succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Get output as string, trimmed.
    pub fn output_trimmed(&self) -> &str {
        self.output.trim()
    }

    /// Get output lines.
    pub fn output_lines(&self) -> impl Iterator<Item = &str> {
        self.output.lines()
    }
}

/// Chunk of output read from one of the process pipes.
#[derive(Debug, Clone)]
pub struct OutputChunk {
    /// Raw bytes.
    pub raw: Vec<u8>,
    /// Stream source.
    pub source: OutputSource,
}

/// Source of output data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSource {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

impl OutputChunk {
    /// Create a stdout chunk.
    pub fn stdout(raw: Vec<u8>) -> Self {
        Self {
            raw,
            source: OutputSource::Stdout,
        }
    }

    /// Create a stderr chunk.
    pub fn stderr(raw: Vec<u8>) -> Self {
        Self {
            raw,
            source: OutputSource::Stderr,
        }
    }
}

/// Accumulates chunks according to the capture mode.
#[derive(Debug)]
pub(crate) struct OutputBuffer {
    capture: OutputCapture,
    output: Vec<u8>,
    errors: Vec<u8>,
}

impl OutputBuffer {
    pub(crate) fn new(capture: OutputCapture) -> Self {
        Self {
            capture,
            output: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, chunk: OutputChunk) {
        match (self.capture, chunk.source) {
            (OutputCapture::Separate, OutputSource::Stderr) => {
                self.errors.extend_from_slice(&chunk.raw)
            }
            (OutputCapture::StdoutOnly, OutputSource::Stderr) => {}
            _ => self.output.extend_from_slice(&chunk.raw),
        }
    }

    pub(crate) fn into_result(self, exit_code: i32, duration: Duration) -> ExecutionResult {
        ExecutionResult::new(exit_code, self.output, duration).with_error_output(&self.errors)
    }
}
