//! Error types for the certificate lifecycle engine.

use std::path::PathBuf;

use certgate_exec::ExecError;
use certgate_ledger::LedgerError;
use snafu::Snafu;

/// Result type for lifecycle operations.
pub type Result<T, E = LifecycleError> = std::result::Result<T, E>;

/// Errors that can occur while driving the authority through a workflow.
///
/// Reconciliation failures are deliberately distinct from tool failures: a
/// caller reacting to [`LifecycleError::SerialMismatch`] is looking at a
/// corrupt or concurrently modified authority, while
/// [`LifecycleError::IssuanceCommand`] just means the tool said no.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum LifecycleError {
    /// The operation was cancelled by the caller.
    #[snafu(display("Operation cancelled"))]
    Cancelled,

    /// A command could not be executed at the process level.
    #[snafu(display("Command execution failed: {source}"))]
    Exec {
        /// Underlying execution error.
        source: ExecError,
    },

    /// The authority ledger could not be read or decoded.
    #[snafu(display("Ledger read failed: {source}"))]
    Ledger {
        /// Underlying ledger error.
        source: LedgerError,
    },

    /// The requested common name is not safe to pass to the authority tools.
    #[snafu(display(
        "Invalid common name {name:?}: expected 1-64 characters from [A-Za-z0-9._-]"
    ))]
    InvalidCommonName {
        /// The rejected name.
        name: String,
    },

    /// An issuance option value is not safe to pass through the shell.
    #[snafu(display("Invalid value {value:?} for {name}"))]
    InvalidOption {
        /// Environment variable the value was destined for.
        name: &'static str,
        /// The rejected value.
        value: String,
    },

    /// The issuance command exited nonzero.
    #[snafu(display("Issuance command for {common_name:?} exited with code {exit_code}"))]
    IssuanceCommand {
        /// Name the certificate was requested for.
        common_name: String,
        /// Tool exit code.
        exit_code: i32,
        /// Captured stdout.
        stdout: String,
        /// Captured stderr.
        stderr: String,
    },

    /// The issuance command succeeded but the ledger shows no matching record.
    #[snafu(display("No active ledger record for {common_name:?} after issuance"))]
    IssuedRecordMissing {
        /// Name that was issued.
        common_name: String,
    },

    /// The serial number query against the certificate file failed.
    #[snafu(display("Certificate serial query failed: {reason}"))]
    SerialQuery {
        /// What went wrong, including tool output where available.
        reason: String,
    },

    /// Ledger and certificate file disagree about the serial number.
    #[snafu(display(
        "Serial cross-check failed: ledger has {ledger_serial:?}, certificate file has {tool_serial:?}"
    ))]
    SerialMismatch {
        /// Serial recorded in the authority ledger.
        ledger_serial: String,
        /// Serial reported by the external tool.
        tool_serial: String,
    },

    /// The certificate file to revoke does not exist locally.
    #[snafu(display("Certificate file not found: {}", path.display()))]
    CertificateFileMissing {
        /// Path that was checked.
        path: PathBuf,
    },

    /// The revocation command failed in a way this engine cannot classify.
    #[snafu(display("Revocation of {common_name:?} failed with code {exit_code} and unrecognized output"))]
    RevocationUnknown {
        /// Name being revoked.
        common_name: String,
        /// Tool exit code.
        exit_code: i32,
        /// Captured stdout.
        stdout: String,
        /// Captured stderr.
        stderr: String,
    },

    /// The revocation command exited with a code outside its known contract.
    #[snafu(display("Revocation of {common_name:?} exited with unexpected code {exit_code}"))]
    RevocationExitCode {
        /// Name being revoked.
        common_name: String,
        /// Tool exit code.
        exit_code: i32,
    },

    /// CRL regeneration exited nonzero.
    #[snafu(display("CRL generation exited with code {exit_code}"))]
    CrlGeneration {
        /// Tool exit code.
        exit_code: i32,
        /// Captured stdout.
        stdout: String,
        /// Captured stderr.
        stderr: String,
    },

    /// CRL regeneration succeeded but the CRL file is missing.
    #[snafu(display("CRL file missing after generation: {}", path.display()))]
    CrlFileMissing {
        /// Expected CRL path.
        path: PathBuf,
    },

    /// A certificate file could not be read for PEM extraction.
    #[snafu(display("Failed to read certificate {}: {source}", path.display()))]
    PemRead {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// No PEM BEGIN marker in the certificate file.
    #[snafu(display("No certificate BEGIN marker in {}", path.display()))]
    PemBeginMarkerMissing {
        /// Path that was scanned.
        path: PathBuf,
    },

    /// PKI initialization did not leave a usable directory behind.
    #[snafu(display("PKI initialization failed: {reason}"))]
    PkiInit {
        /// What went wrong.
        reason: String,
    },
}

impl From<ExecError> for LifecycleError {
    fn from(error: ExecError) -> Self {
        match error {
            ExecError::Cancelled => Self::Cancelled,
            other => Self::Exec { source: other },
        }
    }
}

impl From<LedgerError> for LifecycleError {
    fn from(error: LedgerError) -> Self {
        match error {
            LedgerError::Cancelled => Self::Cancelled,
            other => Self::Ledger { source: other },
        }
    }
}
