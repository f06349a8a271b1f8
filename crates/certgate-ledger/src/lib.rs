//! Parser for the EasyRSA authority ledger (`index.txt`).
//!
//! EasyRSA records every certificate it has ever issued as one tab-separated
//! line in `pki/index.txt`. This crate decodes that file into typed
//! [`CertificateRecord`] values so the lifecycle engine can reconcile what the
//! authority believes against what the issuing commands reported.
//!
//! The ledger is the authority's own database and is rewritten in place by the
//! EasyRSA tooling, so the parser is deliberately conservative:
//!
//! - Lines with fewer than six tab-separated fields are skipped, not errors.
//!   A partially written line must never abort a scan of the whole database.
//! - Timestamps must match the `YYMMDDHHMMSSZ` grammar exactly. A malformed
//!   timestamp on a structurally complete line means the database is corrupt,
//!   and that is an error.
//! - Records are returned in file order. Callers that pick "the" record for a
//!   common name rely on that order being preserved.

mod error;
mod parse;
mod record;

pub use error::LedgerError;
pub use error::Result;
pub use parse::LEDGER_FILE_NAME;
pub use parse::parse_ledger_dir;
pub use parse::parse_ledger_file;
pub use parse::parse_utc_timestamp;
pub use record::CertificateRecord;
pub use record::CertificateStatus;
