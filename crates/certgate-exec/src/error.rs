//! Error types for command execution.

use std::time::Duration;

use snafu::Snafu;

/// Result type for execution operations.
pub type Result<T, E = ExecError> = std::result::Result<T, E>;

/// Errors that can occur while running an external command.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ExecError {
    /// The shell process could not be spawned at all.
    #[snafu(display("Failed to spawn shell for command {command:?}: {source}"))]
    SpawnProcess {
        /// Command line that was being launched.
        command: String,
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// The process exited but its output pipes did not close in time.
    ///
    /// This happens when the command leaves a background child holding the
    /// pipe open. The collected output is discarded because it cannot be
    /// known to be complete.
    #[snafu(display("Output streams not drained within {:?} of process exit", timeout))]
    DrainTimeout {
        /// How long draining was allowed to take.
        timeout: Duration,
    },

    /// The operation was cancelled before or during execution.
    #[snafu(display("Command execution cancelled"))]
    Cancelled,
}
