//! certgate: certificate lifecycle engine driving an EasyRSA authority.
//!
//! certgate does not implement a certificate authority. It orchestrates an
//! existing EasyRSA installation through its command-line tools, reads the
//! authority's own ledger back as the source of truth, and cross-checks what
//! the tools report against what landed on disk. The interesting problems
//! are therefore subprocess supervision (cancellation must kill whole
//! process trees), strict parsing of the `index.txt` ledger, and
//! reconciling several sources of truth that can disagree.
//!
//! ## Crate layout
//!
//! - [`lifecycle`]: the issue and revoke workflows, listing, PEM
//!   extraction, PKI initialization
//! - [`config`]: environment-backed settings for the CLI
//! - [`paths`]: the authority's on-disk layout
//! - [`pem`]: PEM block extraction
//! - `certgate-exec` (re-exported): process groups, cancellation, and the
//!   [`CommandExecutor`] seam
//! - `certgate-ledger` (re-exported): `index.txt` parsing
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use certgate::CertificateService;
//! use certgate::EasyRsaInvoker;
//! use certgate::IssueOptions;
//! use tokio_util::sync::CancellationToken;
//!
//! let service = CertificateService::new(Arc::new(EasyRsaInvoker::new()));
//! let cancel = CancellationToken::new();
//! let result = service
//!     .build_certificate("/opt/authority".as_ref(), "client1", &IssueOptions::default(), &cancel)
//!     .await?;
//! println!("issued serial {}", result.serial);
//! ```

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod paths;
pub mod pem;

#[cfg(test)]
pub(crate) mod test_support;

pub use certgate_exec::CommandExecutor;
pub use certgate_exec::CommandOutcome;
pub use certgate_exec::EasyRsaInvoker;
pub use certgate_exec::EasyRsaRequest;
pub use certgate_exec::ExecError;
pub use certgate_exec::ShellOutput;
pub use certgate_exec::ShellRunner;
pub use certgate_ledger::CertificateRecord;
pub use certgate_ledger::CertificateStatus;
pub use certgate_ledger::LedgerError;

pub use crate::config::CertgateConfig;
pub use crate::error::LifecycleError;
pub use crate::error::Result;
pub use crate::lifecycle::BuildResult;
pub use crate::lifecycle::CertificateService;
pub use crate::lifecycle::IssueOptions;
pub use crate::lifecycle::KeyAlgorithm;
pub use crate::lifecycle::RevokeOptions;
pub use crate::lifecycle::RevokeOutcome;
pub use crate::lifecycle::RevokeResult;
pub use crate::paths::PkiLayout;
