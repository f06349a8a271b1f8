//! Declarative EasyRSA invocations and the executor seam.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::ExecError;
use crate::ShellOutput;
use crate::ShellRunner;
use crate::error;
use crate::error::Result;

/// Exit code recorded when the command never produced one of its own
/// (spawn failure, drain timeout). Distinct from every real tool exit code.
pub const ORCHESTRATOR_FAILURE_EXIT_CODE: i32 = 500;

/// One EasyRSA invocation, described before rendering to a command line.
///
/// Rendered as `cd <root> && [EASYRSA_BATCH=1] [VAR=value ...] ./easyrsa
/// <args>`: the tool resolves its `pki/` state relative to the working
/// directory, so every invocation starts by entering the authority root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EasyRsaRequest {
    /// Directory containing the `easyrsa` script and the `pki/` state.
    pub authority_root: PathBuf,
    /// Subcommand and its arguments, e.g. `revoke client1`.
    pub args: String,
    /// Prefix the invocation with `EASYRSA_BATCH=1` to suppress the
    /// interactive confirmation prompt.
    pub batch: bool,
    /// Additional `VAR=value` assignments prefixed to the invocation.
    pub env: Vec<(String, String)>,
}

impl EasyRsaRequest {
    /// Creates a non-batch request with no extra environment.
    pub fn new(authority_root: impl Into<PathBuf>, args: impl Into<String>) -> Self {
        Self {
            authority_root: authority_root.into(),
            args: args.into(),
            batch: false,
            env: Vec::new(),
        }
    }

    /// Enables batch mode (`EASYRSA_BATCH=1`).
    pub fn batch(mut self) -> Self {
        self.batch = true;
        self
    }

    /// Adds a `VAR=value` environment assignment to the invocation.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Renders the request as the shell command line to execute.
    pub fn to_command(&self) -> String {
        let mut command = format!("cd {} && ", self.authority_root.display());
        if self.batch {
            command.push_str("EASYRSA_BATCH=1 ");
        }
        for (key, value) in &self.env {
            command.push_str(&format!("{key}={value} "));
        }
        command.push_str(&format!("./easyrsa {}", self.args));
        command
    }
}

/// Result of one EasyRSA invocation, failures included.
///
/// `success` reflects the tool's exit code alone. When the command could not
/// be run at all the failure is folded in here with
/// [`ORCHESTRATOR_FAILURE_EXIT_CODE`] and the error text in `error`, so
/// callers classify every non-cancellation outcome through one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutcome {
    /// Whether the tool exited with code zero.
    pub success: bool,
    /// Captured stdout.
    pub output: String,
    /// Exit code of the tool, or the orchestrator sentinel.
    pub exit_code: i32,
    /// Captured stderr on failure (empty on success), or the orchestrator
    /// failure text.
    pub error: String,
}

impl CommandOutcome {
    fn from_shell(output: ShellOutput) -> Self {
        let success = output.success();
        Self {
            success,
            output: output.stdout,
            exit_code: output.exit_code,
            error: if success { String::new() } else { output.stderr },
        }
    }

    fn from_failure(error: &ExecError) -> Self {
        Self {
            success: false,
            output: String::new(),
            exit_code: ORCHESTRATOR_FAILURE_EXIT_CODE,
            error: error.to_string(),
        }
    }
}

/// Seam between lifecycle workflows and real command execution.
///
/// Production uses [`EasyRsaInvoker`]; workflow tests substitute a scripted
/// implementation so issuance and revocation logic runs against canned
/// outputs instead of a live PKI.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Runs a raw shell command line.
    async fn run_shell(&self, command: &str, cancel: &CancellationToken) -> Result<ShellOutput>;

    /// Runs one EasyRSA invocation.
    ///
    /// Cancellation is the only error this returns. Every other runner
    /// failure is folded into the [`CommandOutcome`] so callers see a single
    /// classification path for "the tool said no" and "the tool never ran".
    async fn execute_easyrsa(
        &self,
        request: &EasyRsaRequest,
        cancel: &CancellationToken,
    ) -> Result<CommandOutcome>;
}

/// Production [`CommandExecutor`] backed by a [`ShellRunner`].
#[derive(Debug, Clone, Default)]
pub struct EasyRsaInvoker {
    runner: ShellRunner,
}

impl EasyRsaInvoker {
    /// Creates an invoker with the default runner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an invoker over a preconfigured runner.
    pub fn with_runner(runner: ShellRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl CommandExecutor for EasyRsaInvoker {
    async fn run_shell(&self, command: &str, cancel: &CancellationToken) -> Result<ShellOutput> {
        self.runner.run(command, cancel).await
    }

    async fn execute_easyrsa(
        &self,
        request: &EasyRsaRequest,
        cancel: &CancellationToken,
    ) -> Result<CommandOutcome> {
        let command = request.to_command();
        info!(command = %command, "executing authority command");

        match self.runner.run(&command, cancel).await {
            Ok(output) => {
                if !output.success() {
                    warn!(
                        exit_code = output.exit_code,
                        stderr = %output.stderr.trim_end(),
                        "authority command failed"
                    );
                }
                Ok(CommandOutcome::from_shell(output))
            }
            Err(ExecError::Cancelled) => error::CancelledSnafu.fail(),
            Err(e) => {
                error!("authority command could not be run: {}", e);
                Ok(CommandOutcome::from_failure(&e))
            }
        }
    }
}
