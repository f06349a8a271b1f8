//! Certificate revocation workflow.
//!
//! The revoke command's exit status alone cannot be trusted: the tool exits 1
//! both for "already revoked" (harmless) and for real failures, and tells
//! them apart only in its output text. The classifier below turns that
//! contract into a closed set of outcomes. Whatever the outcome short of a
//! fatal error, the CRL is regenerated afterwards so the published revocation
//! state never lags the ledger.

use std::path::Path;

use certgate_exec::CommandExecutor;
use certgate_exec::CommandOutcome;
use certgate_exec::EasyRsaRequest;
use serde::Deserialize;
use serde::Serialize;
use snafu::ensure;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::error;
use crate::error::Result;
use crate::lifecycle::RevokeResult;
use crate::lifecycle::options::RevokeOptions;
use crate::lifecycle::options::validate_common_name;
use crate::paths::PkiLayout;

/// Marker the tool prints when the certificate was revoked earlier.
const ALREADY_REVOKED_MARKER: &str = "ERROR:Already revoked";

/// Marker the tool prints when the name is not in its database.
const NOT_FOUND_MARKER: &str = "ERROR: Certificate not found";

/// Classified result of a revocation command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevokeOutcome {
    /// The certificate was revoked by this invocation.
    Revoked,
    /// The authority had already revoked it; nothing changed.
    AlreadyRevoked,
    /// The authority has no certificate under this name.
    NotFound,
    /// Exit code 1 with output matching no known marker.
    UnknownFailure,
    /// An exit code outside the tool's 0/1 contract.
    UnexpectedExit,
}

impl RevokeOutcome {
    /// True for outcomes that leave the authority in a coherent state and
    /// let the workflow continue to CRL regeneration.
    pub fn is_coherent(self) -> bool {
        matches!(self, Self::Revoked | Self::AlreadyRevoked | Self::NotFound)
    }
}

/// Maps a revocation command outcome to a [`RevokeOutcome`].
///
/// Exit code dominates: markers are only consulted for exit code 1, and both
/// output streams are searched for both markers.
pub(crate) fn classify_revocation(outcome: &CommandOutcome) -> RevokeOutcome {
    match outcome.exit_code {
        0 => RevokeOutcome::Revoked,
        1 if contains_marker(outcome, ALREADY_REVOKED_MARKER) => RevokeOutcome::AlreadyRevoked,
        1 if contains_marker(outcome, NOT_FOUND_MARKER) => RevokeOutcome::NotFound,
        1 => RevokeOutcome::UnknownFailure,
        _ => RevokeOutcome::UnexpectedExit,
    }
}

fn contains_marker(outcome: &CommandOutcome, marker: &str) -> bool {
    outcome.output.contains(marker) || outcome.error.contains(marker)
}

pub(crate) async fn run_revoke(
    executor: &dyn CommandExecutor,
    authority_root: &Path,
    common_name: &str,
    options: &RevokeOptions,
    cancel: &CancellationToken,
) -> Result<RevokeResult> {
    validate_common_name(common_name)?;

    let layout = PkiLayout::new(authority_root);
    info!(
        common_name,
        authority_root = %authority_root.display(),
        "starting certificate revocation"
    );

    let certificate_path = layout.issued_cert_path(common_name);
    ensure!(
        certificate_path.exists(),
        error::CertificateFileMissingSnafu { path: certificate_path }
    );

    let request = EasyRsaRequest::new(authority_root, format!("revoke {common_name}")).batch();
    let command_outcome = executor.execute_easyrsa(&request, cancel).await?;

    let outcome = classify_revocation(&command_outcome);
    let message = match outcome {
        RevokeOutcome::Revoked => {
            info!(common_name, "certificate revoked");
            format!("certificate revoked: {common_name}")
        }
        RevokeOutcome::AlreadyRevoked => {
            warn!(common_name, "certificate was already revoked");
            format!("certificate already revoked: {common_name}")
        }
        RevokeOutcome::NotFound => {
            warn!(common_name, "certificate not found in authority database");
            format!("certificate not found in authority database: {common_name}")
        }
        RevokeOutcome::UnknownFailure => {
            error!(
                common_name,
                stderr = %command_outcome.error.trim_end(),
                "revocation failed with unrecognized output"
            );
            return error::RevocationUnknownSnafu {
                common_name,
                exit_code: command_outcome.exit_code,
                stdout: command_outcome.output,
                stderr: command_outcome.error,
            }
            .fail();
        }
        RevokeOutcome::UnexpectedExit => {
            error!(
                common_name,
                exit_code = command_outcome.exit_code,
                "revocation exited outside the tool's contract"
            );
            return error::RevocationExitCodeSnafu {
                common_name,
                exit_code: command_outcome.exit_code,
            }
            .fail();
        }
    };

    regenerate_crl(executor, authority_root, &layout, options, cancel).await?;

    Ok(RevokeResult {
        common_name: common_name.to_owned(),
        certificate_path,
        outcome,
        message,
    })
}

/// Regenerates the CRL and verifies the file exists afterwards.
///
/// Runs after every coherent revocation outcome, including "already
/// revoked" and "not found": a previous run may have revoked the ledger
/// entry and then died before publishing the CRL.
async fn regenerate_crl(
    executor: &dyn CommandExecutor,
    authority_root: &Path,
    layout: &PkiLayout,
    options: &RevokeOptions,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut request = EasyRsaRequest::new(authority_root, "gen-crl");
    if let Some(days) = options.crl_days {
        request = request.env("EASYRSA_CRL_DAYS", days.to_string());
    }

    let outcome = executor.execute_easyrsa(&request, cancel).await?;
    if !outcome.success {
        error!(exit_code = outcome.exit_code, "CRL generation failed");
        return error::CrlGenerationSnafu {
            exit_code: outcome.exit_code,
            stdout: outcome.output,
            stderr: outcome.error,
        }
        .fail();
    }

    let crl_path = layout.crl_path();
    ensure!(crl_path.exists(), error::CrlFileMissingSnafu { path: crl_path });

    info!(path = %layout.crl_path().display(), "CRL regenerated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::error::LifecycleError;
    use crate::test_support::ScriptedExecutor;
    use crate::test_support::outcome_fail;
    use crate::test_support::outcome_ok;

    /// Authority root with an issued certificate and a CRL already on disk.
    fn authority_with_cert(common_name: &str) -> TempDir {
        let root = TempDir::new().unwrap();
        let pki = root.path().join("pki");
        std::fs::create_dir_all(pki.join("issued")).unwrap();
        std::fs::write(pki.join("issued").join(format!("{common_name}.crt")), "cert").unwrap();
        std::fs::write(pki.join("crl.pem"), "crl").unwrap();
        root
    }

    #[test]
    fn exit_code_dominates_classification() {
        let ok_with_marker = CommandOutcome {
            success: true,
            output: format!("{ALREADY_REVOKED_MARKER}\n"),
            exit_code: 0,
            error: String::new(),
        };
        assert_eq!(classify_revocation(&ok_with_marker), RevokeOutcome::Revoked);
    }

    #[test]
    fn markers_are_found_in_either_stream() {
        let in_stdout = outcome_fail(1, ALREADY_REVOKED_MARKER, "");
        let in_stderr = outcome_fail(1, "", ALREADY_REVOKED_MARKER);
        assert_eq!(classify_revocation(&in_stdout), RevokeOutcome::AlreadyRevoked);
        assert_eq!(classify_revocation(&in_stderr), RevokeOutcome::AlreadyRevoked);

        let not_found_stderr = outcome_fail(1, "", NOT_FOUND_MARKER);
        assert_eq!(classify_revocation(&not_found_stderr), RevokeOutcome::NotFound);
    }

    #[test]
    fn exit_one_without_markers_is_unknown() {
        let outcome = outcome_fail(1, "something odd", "no marker here");
        assert_eq!(classify_revocation(&outcome), RevokeOutcome::UnknownFailure);
    }

    #[test]
    fn exit_codes_outside_contract_are_unexpected() {
        for code in [2, 7, 127, 500, -1] {
            let outcome = outcome_fail(code, "", "");
            assert_eq!(classify_revocation(&outcome), RevokeOutcome::UnexpectedExit, "{code}");
        }
    }

    #[test]
    fn only_non_fatal_outcomes_are_coherent() {
        assert!(RevokeOutcome::Revoked.is_coherent());
        assert!(RevokeOutcome::AlreadyRevoked.is_coherent());
        assert!(RevokeOutcome::NotFound.is_coherent());
        assert!(!RevokeOutcome::UnknownFailure.is_coherent());
        assert!(!RevokeOutcome::UnexpectedExit.is_coherent());
    }

    #[tokio::test]
    async fn revokes_and_regenerates_crl() {
        let root = authority_with_cert("client1");
        let executor = ScriptedExecutor::new()
            .expect_easyrsa("revoke client1", outcome_ok("Revocation was successful\n"))
            .expect_easyrsa("gen-crl", outcome_ok("An updated CRL has been created\n"));

        let result = run_revoke(
            &executor,
            root.path(),
            "client1",
            &RevokeOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(result.outcome, RevokeOutcome::Revoked);
        assert!(result.revoked());
        assert!(result.message.contains("client1"));

        let calls = executor.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].contains("EASYRSA_BATCH=1 ./easyrsa revoke client1"));
        assert!(calls[1].contains("./easyrsa gen-crl"));
    }

    #[tokio::test]
    async fn already_revoked_still_regenerates_crl() {
        let root = authority_with_cert("client1");
        let executor = ScriptedExecutor::new()
            .expect_easyrsa("revoke client1", outcome_fail(1, "", "ERROR:Already revoked\n"))
            .expect_easyrsa("gen-crl", outcome_ok(""));

        let result = run_revoke(
            &executor,
            root.path(),
            "client1",
            &RevokeOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(result.outcome, RevokeOutcome::AlreadyRevoked);
        assert!(!result.revoked());
        assert!(executor.calls().iter().any(|call| call.contains("gen-crl")));
    }

    #[tokio::test]
    async fn not_found_still_regenerates_crl() {
        let root = authority_with_cert("client1");
        let executor = ScriptedExecutor::new()
            .expect_easyrsa("revoke client1", outcome_fail(1, "ERROR: Certificate not found\n", ""))
            .expect_easyrsa("gen-crl", outcome_ok(""));

        let result = run_revoke(
            &executor,
            root.path(),
            "client1",
            &RevokeOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(result.outcome, RevokeOutcome::NotFound);
        assert!(executor.calls().iter().any(|call| call.contains("gen-crl")));
    }

    #[tokio::test]
    async fn unknown_failure_skips_crl_regeneration() {
        let root = authority_with_cert("client1");
        let executor = ScriptedExecutor::new()
            .expect_easyrsa("revoke client1", outcome_fail(1, "", "disk on fire\n"));

        let err = run_revoke(
            &executor,
            root.path(),
            "client1",
            &RevokeOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, LifecycleError::RevocationUnknown { .. }));
        assert_eq!(executor.calls().len(), 1);
    }

    #[tokio::test]
    async fn unexpected_exit_code_is_fatal() {
        let root = authority_with_cert("client1");
        let executor = ScriptedExecutor::new()
            .expect_easyrsa("revoke client1", outcome_fail(7, "", ""));

        let err = run_revoke(
            &executor,
            root.path(),
            "client1",
            &RevokeOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        match err {
            LifecycleError::RevocationExitCode { exit_code, .. } => assert_eq!(exit_code, 7),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unrunnable_revoke_command_is_an_unexpected_exit() {
        let root = authority_with_cert("client1");
        // Outcome the orchestrator produces when the tool never ran.
        let executor = ScriptedExecutor::new()
            .expect_easyrsa("revoke client1", outcome_fail(500, "", "Failed to spawn shell"));

        let err = run_revoke(
            &executor,
            root.path(),
            "client1",
            &RevokeOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, LifecycleError::RevocationExitCode { exit_code: 500, .. }));
    }

    #[tokio::test]
    async fn missing_certificate_file_fails_before_any_command() {
        let root = TempDir::new().unwrap();
        let executor = ScriptedExecutor::new();

        let err = run_revoke(
            &executor,
            root.path(),
            "client1",
            &RevokeOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, LifecycleError::CertificateFileMissing { .. }));
        assert!(executor.calls().is_empty());
    }

    #[tokio::test]
    async fn crl_days_option_is_passed_to_the_tool() {
        let root = authority_with_cert("client1");
        let executor = ScriptedExecutor::new()
            .expect_easyrsa("revoke client1", outcome_ok(""))
            .expect_easyrsa("EASYRSA_CRL_DAYS=3650 ./easyrsa gen-crl", outcome_ok(""));

        run_revoke(
            &executor,
            root.path(),
            "client1",
            &RevokeOptions { crl_days: Some(3650) },
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn failed_crl_generation_is_an_error() {
        let root = authority_with_cert("client1");
        let executor = ScriptedExecutor::new()
            .expect_easyrsa("revoke client1", outcome_ok(""))
            .expect_easyrsa("gen-crl", outcome_fail(1, "", "cannot write crl\n"));

        let err = run_revoke(
            &executor,
            root.path(),
            "client1",
            &RevokeOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, LifecycleError::CrlGeneration { exit_code: 1, .. }));
    }

    #[tokio::test]
    async fn missing_crl_file_after_generation_is_an_error() {
        let root = TempDir::new().unwrap();
        let pki = root.path().join("pki");
        std::fs::create_dir_all(pki.join("issued")).unwrap();
        std::fs::write(pki.join("issued/client1.crt"), "cert").unwrap();
        // No crl.pem on disk.

        let executor = ScriptedExecutor::new()
            .expect_easyrsa("revoke client1", outcome_ok(""))
            .expect_easyrsa("gen-crl", outcome_ok(""));

        let err = run_revoke(
            &executor,
            root.path(),
            "client1",
            &RevokeOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, LifecycleError::CrlFileMissing { .. }));
    }

    #[tokio::test]
    async fn cancellation_surfaces_unchanged() {
        let root = authority_with_cert("client1");
        let executor = ScriptedExecutor::new().expect_cancelled("revoke client1");

        let err = run_revoke(
            &executor,
            root.path(),
            "client1",
            &RevokeOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, LifecycleError::Cancelled));
    }
}
