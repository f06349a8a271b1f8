//! Certificate lifecycle workflows over an EasyRSA authority.
//!
//! [`CertificateService`] is the crate's front door. Each operation takes the
//! authority root explicitly (one service can drive many authorities) plus a
//! cancellation token, and returns typed results or a
//! [`LifecycleError`](crate::error::LifecycleError) describing exactly which
//! step refused.

mod build;
mod options;
mod revoke;

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use certgate_exec::CommandExecutor;
use certgate_exec::EasyRsaInvoker;
use certgate_exec::EasyRsaRequest;
use certgate_ledger::CertificateRecord;
use serde::Deserialize;
use serde::Serialize;
use snafu::ensure;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error;
use crate::error::Result;
use crate::paths::PkiLayout;
use crate::pem;

pub use options::IssueOptions;
pub use options::KeyAlgorithm;
pub use options::RevokeOptions;
pub use revoke::RevokeOutcome;

/// Everything a caller needs to hand out after an issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildResult {
    /// Common name the certificate was issued for.
    pub common_name: String,
    /// Serial recorded in the authority ledger.
    pub serial: String,
    /// Certificate signing request path.
    pub request_path: PathBuf,
    /// Issued certificate path.
    pub certificate_path: PathBuf,
    /// Private key path.
    pub key_path: PathBuf,
    /// Serial-indexed certificate copy path.
    pub pem_path: PathBuf,
}

/// Result of a revocation workflow run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevokeResult {
    /// Common name the revocation targeted.
    pub common_name: String,
    /// Certificate file the workflow checked before revoking.
    pub certificate_path: PathBuf,
    /// Classified outcome of the revoke command.
    pub outcome: RevokeOutcome,
    /// Human-readable summary of what happened.
    pub message: String,
}

impl RevokeResult {
    /// True when this run is what revoked the certificate.
    pub fn revoked(&self) -> bool {
        self.outcome == RevokeOutcome::Revoked
    }
}

/// Drives certificate issuance, revocation, and inspection workflows.
pub struct CertificateService {
    executor: Arc<dyn CommandExecutor>,
}

impl CertificateService {
    /// Creates a service over the given executor.
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    /// Issues a client certificate and reconciles the result.
    ///
    /// Runs the issuance command, re-reads the ledger for the first active
    /// record under `common_name`, cross-checks its serial against the
    /// certificate file, and returns the paths of every produced artifact.
    pub async fn build_certificate(
        &self,
        authority_root: &Path,
        common_name: &str,
        options: &IssueOptions,
        cancel: &CancellationToken,
    ) -> Result<BuildResult> {
        build::run_build(self.executor.as_ref(), authority_root, common_name, options, cancel).await
    }

    /// Revokes a certificate and regenerates the CRL.
    ///
    /// "Already revoked" and "not found" are reported as outcomes, not
    /// errors, and the CRL is regenerated for those as well.
    pub async fn revoke_certificate(
        &self,
        authority_root: &Path,
        common_name: &str,
        options: &RevokeOptions,
        cancel: &CancellationToken,
    ) -> Result<RevokeResult> {
        revoke::run_revoke(self.executor.as_ref(), authority_root, common_name, options, cancel)
            .await
    }

    /// Lists every certificate in the authority ledger, in file order.
    pub async fn list_certificates(
        &self,
        pki_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<Vec<CertificateRecord>> {
        Ok(certgate_ledger::parse_ledger_dir(pki_dir, cancel).await?)
    }

    /// Extracts the PEM block from a certificate file.
    pub async fn read_certificate_pem(
        &self,
        certificate_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<String> {
        pem::read_certificate_pem(certificate_path, cancel).await
    }

    /// Initializes the authority's `pki/` directory if it is missing.
    ///
    /// Returns `true` when this call ran `init-pki`, `false` when the
    /// directory was already present.
    pub async fn init_pki(&self, authority_root: &Path, cancel: &CancellationToken) -> Result<bool> {
        let layout = PkiLayout::new(authority_root);
        if layout.pki_dir().exists() {
            info!(pki_dir = %layout.pki_dir().display(), "PKI directory already present");
            return Ok(false);
        }

        info!(authority_root = %authority_root.display(), "initializing PKI directory");
        let request = EasyRsaRequest::new(authority_root, "init-pki").batch();
        let outcome = self.executor.execute_easyrsa(&request, cancel).await?;
        ensure!(
            outcome.success,
            error::PkiInitSnafu {
                reason: format!(
                    "init-pki exited with code {}: {}",
                    outcome.exit_code,
                    outcome.error.trim()
                ),
            }
        );
        ensure!(
            layout.pki_dir().exists(),
            error::PkiInitSnafu {
                reason: format!("{} still missing after init-pki", layout.pki_dir().display()),
            }
        );
        Ok(true)
    }
}

impl Default for CertificateService {
    fn default() -> Self {
        Self::new(Arc::new(EasyRsaInvoker::new()))
    }
}
