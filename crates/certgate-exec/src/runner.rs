//! Process-group shell execution with full output capture.
//!
//! The authority tools fork helpers (`openssl`, shell functions), so a plain
//! child kill can leave grandchildren writing to a half-revoked PKI. Every
//! command here runs as its own process group and cancellation signals the
//! whole group: SIGTERM, a bounded grace period, then SIGKILL.

use std::process::Stdio;
use std::time::Duration;

use command_group::AsyncCommandGroup;
use command_group::AsyncGroupChild;
use serde::Deserialize;
use serde::Serialize;
use snafu::ResultExt;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncRead;
use tokio::io::BufReader;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::error;
use crate::error::Result;

/// Grace period for SIGTERM before SIGKILL.
const GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Bound on collecting remaining pipe output after the child exits.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Shell used when none is configured.
const DEFAULT_SHELL: &str = "bash";

/// Captured result of one shell command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellOutput {
    /// Everything the command wrote to stdout.
    pub stdout: String,
    /// Everything the command wrote to stderr.
    pub stderr: String,
    /// Exit code, or -1 when the process died without one (signal).
    pub exit_code: i32,
}

impl ShellOutput {
    /// True when the command exited with code zero.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs shell command lines as cancellable process groups.
///
/// The shell binary and extra environment variables are configurable so tests
/// can point commands at fixture tools; production uses plain `bash` with the
/// inherited environment.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
    env: Vec<(String, String)>,
}

impl ShellRunner {
    /// Creates a runner using the default shell.
    pub fn new() -> Self {
        Self::with_shell(DEFAULT_SHELL)
    }

    /// Creates a runner using a specific shell binary.
    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            env: Vec::new(),
        }
    }

    /// Adds an environment variable to every spawned command.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Runs `<shell> -c <command>` to completion.
    ///
    /// Both output streams are captured in full. After the process exits,
    /// draining the pipes is bounded by [`DRAIN_TIMEOUT`] so a background
    /// child inheriting the pipes cannot stall the caller forever.
    ///
    /// On cancellation the whole process group is terminated before
    /// [`ExecError::Cancelled`](crate::ExecError::Cancelled) is returned.
    /// Termination failures are logged and swallowed: at that point the
    /// caller is abandoning the operation and has no use for a kill error.
    pub async fn run(&self, command: &str, cancel: &CancellationToken) -> Result<ShellOutput> {
        if cancel.is_cancelled() {
            return error::CancelledSnafu.fail();
        }

        debug!(shell = %self.shell, command, "spawning shell command");

        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        // Spawn as process group for clean termination
        let mut child: AsyncGroupChild = cmd.group_spawn().context(error::SpawnProcessSnafu {
            command: command.to_owned(),
        })?;

        let stdout = child.inner().stdout.take().expect("stdout piped");
        let stderr = child.inner().stderr.take().expect("stderr piped");

        let stdout_handle = tokio::spawn(collect_stream(stdout, "stdout"));
        let stderr_handle = tokio::spawn(collect_stream(stderr, "stderr"));

        enum ExitReason {
            Completed(std::process::ExitStatus),
            WaitError(std::io::Error),
            Cancelled,
        }

        let exit_reason = tokio::select! {
            wait_result = child.wait() => {
                match wait_result {
                    Ok(status) => ExitReason::Completed(status),
                    Err(e) => ExitReason::WaitError(e),
                }
            }
            _ = cancel.cancelled() => {
                ExitReason::Cancelled
            }
        };

        let exit_code = match exit_reason {
            ExitReason::Completed(status) => status.code().unwrap_or(-1),
            ExitReason::WaitError(e) => {
                error!("process wait failed: {}", e);
                -1
            }
            ExitReason::Cancelled => {
                info!(command, "command cancelled, terminating process group");
                terminate_process_group(&mut child, GRACE_PERIOD).await;
                return error::CancelledSnafu.fail();
            }
        };

        let (stdout, stderr) = drain_output(stdout_handle, stderr_handle).await?;

        debug!(exit_code, "shell command completed");
        Ok(ShellOutput {
            stdout,
            stderr,
            exit_code,
        })
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Collects one output stream to EOF.
async fn collect_stream<R>(stream: R, name: &'static str) -> String
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    let mut collected = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => break, // EOF
            Ok(_) => collected.push_str(&line),
            Err(e) => {
                warn!(stream = name, "error reading process output: {}", e);
                break;
            }
        }
    }
    collected
}

/// Awaits both reader tasks, bounded by [`DRAIN_TIMEOUT`].
///
/// The pipes normally close the moment the process exits. They stay open
/// when the command left a background child behind, and that child's output
/// is not part of this command's result.
async fn drain_output(
    mut stdout_handle: JoinHandle<String>,
    mut stderr_handle: JoinHandle<String>,
) -> Result<(String, String)> {
    let both = async { tokio::join!(&mut stdout_handle, &mut stderr_handle) };
    match tokio::time::timeout(DRAIN_TIMEOUT, both).await {
        Ok((stdout, stderr)) => Ok((stdout.unwrap_or_default(), stderr.unwrap_or_default())),
        Err(_) => {
            stdout_handle.abort();
            stderr_handle.abort();
            error::DrainTimeoutSnafu { timeout: DRAIN_TIMEOUT }.fail()
        }
    }
}

/// Terminate a process group gracefully.
///
/// On Unix:
/// 1. Send SIGTERM to process group
/// 2. Wait for grace period
/// 3. Send SIGKILL if still running
/// 4. Reap the process
#[cfg(unix)]
async fn terminate_process_group(child: &mut AsyncGroupChild, grace: Duration) {
    use nix::sys::signal;
    use nix::sys::signal::Signal;
    use nix::unistd::Pid;

    let Some(pid) = child.inner().id() else {
        return; // Already exited
    };
    let pgid = Pid::from_raw(-(pid as i32));

    // Send SIGTERM to process group
    if let Err(e) = signal::kill(pgid, Signal::SIGTERM)
        && e != nix::errno::Errno::ESRCH
    {
        warn!(pid, error = ?e, "SIGTERM to process group failed");
    }

    // Wait for graceful exit
    let deadline = tokio::time::Instant::now() + grace;
    while tokio::time::Instant::now() < deadline {
        if child.inner().try_wait().ok().flatten().is_some() {
            return; // Exited gracefully
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    // Force kill
    if let Err(e) = signal::kill(pgid, Signal::SIGKILL)
        && e != nix::errno::Errno::ESRCH
    {
        warn!(pid, error = ?e, "SIGKILL to process group failed");
    }

    // Reap
    let _ = child.wait().await;
}

#[cfg(not(unix))]
async fn terminate_process_group(child: &mut AsyncGroupChild, _grace: Duration) {
    // On non-Unix, just kill directly via the async method
    let _ = child.kill().await;
    let _ = child.wait().await;
}
