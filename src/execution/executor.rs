//! Process spawning, output draining and timeout enforcement.

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

use super::command::{Command, ExecutionOptions, OutputCapture};
use super::compose::{compose, ComposedCommand};
use super::result::{ExecutionResult, OutputBuffer, OutputChunk};
use crate::error::RunnerError;
use crate::Result;

/// Default buffer size for reading process output.
const READ_BUFFER_SIZE: usize = 4096;

/// How long readers may keep draining after the process has exited.
pub const READER_GRACE_PERIOD: Duration = Duration::from_secs(2);

/// Runs composed commands as OS processes.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    reader_grace: Duration,
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessExecutor {
    /// Create an executor with the default reader grace period.
    pub fn new() -> Self {
        Self {
            reader_grace: READER_GRACE_PERIOD,
        }
    }

    /// Override the reader grace period.
    pub fn with_reader_grace(mut self, grace: Duration) -> Self {
        self.reader_grace = grace;
        self
    }

    /// Run `composed` with the working directory, timeout and capture mode
    /// from `options`. The deadline starts now.
    pub async fn run(
        &self,
        composed: &ComposedCommand,
        options: &ExecutionOptions,
    ) -> Result<ExecutionResult> {
        self.run_from(Instant::now(), composed, options).await
    }

    /// Like [`run`](Self::run), with the deadline measured from `started`.
    ///
    /// On timeout the whole process group is killed and reaped before
    /// [`RunnerError::Timeout`] is returned.
    pub async fn run_from(
        &self,
        started: Instant,
        composed: &ComposedCommand,
        options: &ExecutionOptions,
    ) -> Result<ExecutionResult> {
        let (mut child, shared) = spawn(composed, options.working_dir_path(), options.capture)?;
        let mut group = ProcessGroup::new(child.id());
        debug!(program = %composed.program, pid = ?child.id(), "spawned process");

        let mut drain = Drain::start(&mut child, options.capture, shared);

        let status = match options.timeout {
            Some(timeout) => {
                tokio::select! {
                    status = child.wait() => status?,
                    _ = time::sleep_until(started + timeout) => {
                        warn!(command = %composed, ?timeout, "command timed out, killing process group");
                        group.kill();
                        if let Err(e) = child.kill().await {
                            debug!(error = %e, "kill after group kill failed");
                        }
                        group.disarm();
                        drain.shutdown().await;
                        return Err(RunnerError::Timeout(timeout));
                    }
                }
            }
            None => child.wait().await?,
        };
        group.disarm();

        let exit_code = exit_code(status);
        debug!(exit_code, "process exited");

        let grace = match options.timeout {
            Some(timeout) => self
                .reader_grace
                .min((started + timeout).saturating_duration_since(Instant::now())),
            None => self.reader_grace,
        };
        let buffer = drain.finish(grace).await;
        Ok(buffer.into_result(exit_code, started.elapsed()))
    }
}

/// Compose and run a command in one call.
pub async fn execute(command: &Command, options: &ExecutionOptions) -> Result<ExecutionResult> {
    options.validate()?;
    let composed = compose(command, options);
    ProcessExecutor::new().run(&composed, options).await
}

/// Execute an argument list with a timeout.
pub async fn execute_with_timeout<I, S>(args: I, timeout: Duration) -> Result<ExecutionResult>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let command = Command::new(args)?;
    execute(&command, &ExecutionOptions::new().timeout(timeout)).await
}

/// Read end shared by stdout and stderr in merged mode.
type SharedPipe = Box<dyn AsyncRead + Send + Unpin>;

fn spawn(
    composed: &ComposedCommand,
    working_dir: Option<&Path>,
    capture: OutputCapture,
) -> Result<(tokio::process::Child, Option<SharedPipe>)> {
    let mut cmd = tokio::process::Command::new(&composed.program);
    cmd.args(&composed.args)
        .stdin(Stdio::null())
        .kill_on_drop(true);

    let shared: Option<SharedPipe> = match capture {
        // One pipe for both streams keeps their relative order.
        #[cfg(unix)]
        OutputCapture::Merged => {
            let (sender, receiver) = tokio::net::unix::pipe::pipe()?;
            let write = sender.into_blocking_fd()?;
            cmd.stderr(Stdio::from(write.try_clone()?))
                .stdout(Stdio::from(write));
            Some(Box::new(receiver) as SharedPipe)
        }
        OutputCapture::StdoutOnly => {
            cmd.stdout(Stdio::piped()).stderr(Stdio::inherit());
            None
        }
        _ => {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
            None
        }
    };

    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }

    // Own group, so a timeout reaches whatever sh or ssh started.
    #[cfg(unix)]
    cmd.process_group(0);

    let child = cmd.spawn().map_err(|source| RunnerError::Spawn {
        program: composed.program.clone(),
        source,
    })?;

    // The parent's write ends close with `cmd`, so the reader sees EOF.
    drop(cmd);
    Ok((child, shared))
}

/// Exit code of a finished process; `128 + signal` when killed by a signal.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

/// Kills the child's process group unless disarmed.
///
/// Must be dropped before the child is reaped, or the group id may be reused.
struct ProcessGroup {
    pgid: Option<u32>,
}

impl ProcessGroup {
    fn new(pid: Option<u32>) -> Self {
        Self { pgid: pid }
    }

    fn kill(&self) {
        #[cfg(unix)]
        if let Some(pgid) = self.pgid {
            use nix::sys::signal::{killpg, Signal};
            use nix::unistd::Pid;

            if let Err(e) = killpg(Pid::from_raw(pgid as i32), Signal::SIGKILL) {
                debug!(pgid, error = %e, "killpg failed");
            }
        }
    }

    fn disarm(&mut self) {
        self.pgid = None;
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

/// Reader tasks for the child's pipes plus the collector they feed.
struct Drain {
    capture: OutputCapture,
    readers: Vec<JoinHandle<()>>,
    collector: Option<JoinHandle<OutputBuffer>>,
}

impl Drain {
    fn start(
        child: &mut tokio::process::Child,
        capture: OutputCapture,
        shared: Option<SharedPipe>,
    ) -> Self {
        let (tx, mut rx) = mpsc::channel::<OutputChunk>(64);
        let mut readers = Vec::with_capacity(2);

        if let Some(pipe) = shared {
            readers.push(tokio::spawn(read_pipe(pipe, tx.clone(), OutputChunk::stdout)));
        }
        if let Some(stdout) = child.stdout.take() {
            readers.push(tokio::spawn(read_pipe(stdout, tx.clone(), OutputChunk::stdout)));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(tokio::spawn(read_pipe(stderr, tx.clone(), OutputChunk::stderr)));
        }
        drop(tx);

        let collector = tokio::spawn(async move {
            let mut buffer = OutputBuffer::new(capture);
            while let Some(chunk) = rx.recv().await {
                buffer.push(chunk);
            }
            buffer
        });

        Self {
            capture,
            readers,
            collector: Some(collector),
        }
    }

    /// Wait up to `grace` for the readers, then collect what was read.
    async fn finish(mut self, grace: Duration) -> OutputBuffer {
        let mut readers = std::mem::take(&mut self.readers);
        let joined = time::timeout(grace, async {
            for reader in readers.iter_mut() {
                let _ = reader.await;
            }
        })
        .await;

        if joined.is_err() {
            warn!(?grace, "output readers still busy after process exit, aborting");
            for reader in &readers {
                reader.abort();
            }
        }

        match self.collector.take() {
            Some(collector) => join_collector(collector, self.capture).await,
            None => OutputBuffer::new(self.capture),
        }
    }

    /// Abort every task and wait until they have released their pipes.
    async fn shutdown(&mut self) {
        self.abort();
        for reader in std::mem::take(&mut self.readers) {
            let _ = reader.await;
        }
        if let Some(collector) = self.collector.take() {
            let _ = collector.await;
        }
    }

    fn abort(&mut self) {
        for reader in &self.readers {
            reader.abort();
        }
        if let Some(collector) = &self.collector {
            collector.abort();
        }
    }
}

impl Drop for Drain {
    fn drop(&mut self) {
        self.abort();
    }
}

async fn join_collector(collector: JoinHandle<OutputBuffer>, capture: OutputCapture) -> OutputBuffer {
    match collector.await {
        Ok(buffer) => buffer,
        Err(e) => {
            warn!(error = %e, "output collector failed, output discarded");
            OutputBuffer::new(capture)
        }
    }
}

async fn read_pipe<R>(mut pipe: R, tx: mpsc::Sender<OutputChunk>, chunk: fn(Vec<u8>) -> OutputChunk)
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; READ_BUFFER_SIZE];
    loop {
        match pipe.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                trace!(bytes = n, "read output chunk");
                if tx.send(chunk(buf[..n].to_vec())).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                debug!(error = %e, "output pipe read failed");
                break;
            }
        }
    }
}
