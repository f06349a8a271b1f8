//! Error types for ledger parsing.

use std::path::PathBuf;

use snafu::Snafu;

/// Result type for ledger operations.
pub type Result<T, E = LedgerError> = std::result::Result<T, E>;

/// Errors that can occur while reading the authority ledger.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum LedgerError {
    /// The ledger file could not be read.
    #[snafu(display("Failed to read ledger {}: {source}", path.display()))]
    Io {
        /// Path of the ledger file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A timestamp field did not match the required grammar.
    #[snafu(display("Invalid ledger timestamp {value:?}: expected YYMMDDHHMMSSZ"))]
    InvalidDateFormat {
        /// The offending timestamp text.
        value: String,
    },

    /// The scan was cancelled before completing.
    #[snafu(display("Ledger scan cancelled"))]
    Cancelled,
}
