//! Certificate issuance workflow.
//!
//! Issuing is a three-step reconciliation, not a single command: run the
//! tool, re-read the authority ledger to learn what was actually recorded,
//! then cross-check the recorded serial against the certificate file via an
//! independent `openssl` query. Only when all three agree does the workflow
//! report success.

use std::path::Path;

use certgate_exec::CommandExecutor;
use certgate_ledger::parse_ledger_dir;
use snafu::OptionExt;
use snafu::ensure;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::error;
use crate::error::Result;
use crate::lifecycle::BuildResult;
use crate::lifecycle::options::IssueOptions;
use crate::lifecycle::options::validate_common_name;
use crate::paths::PkiLayout;

pub(crate) async fn run_build(
    executor: &dyn CommandExecutor,
    authority_root: &Path,
    common_name: &str,
    options: &IssueOptions,
    cancel: &CancellationToken,
) -> Result<BuildResult> {
    validate_common_name(common_name)?;
    options.validate()?;

    let layout = PkiLayout::new(authority_root);
    info!(
        common_name,
        authority_root = %authority_root.display(),
        "starting certificate issuance"
    );

    let request_path = layout.request_path(common_name);
    if request_path.exists() {
        // The tool refuses to overwrite an existing request; surface the
        // likely cause before it fails.
        warn!(path = %request_path.display(), "certificate request already exists");
    }

    let command = issuance_command(authority_root, common_name, options);
    let output = executor.run_shell(&command, cancel).await?;
    if !output.success() {
        error!(
            common_name,
            exit_code = output.exit_code,
            stderr = %output.stderr.trim_end(),
            "issuance command failed"
        );
        return error::IssuanceCommandSnafu {
            common_name,
            exit_code: output.exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
        }
        .fail();
    }
    info!(common_name, "issuance command completed");

    let records = parse_ledger_dir(layout.pki_dir(), cancel).await?;
    let record = records
        .into_iter()
        .find(|record| record.is_active() && record.common_name == common_name)
        .context(error::IssuedRecordMissingSnafu { common_name })?;

    let certificate_path = layout.issued_cert_path(common_name);
    let tool_serial = query_certificate_serial(executor, &certificate_path, cancel).await?;
    ensure!(
        record.serial.contains(tool_serial.as_str()),
        error::SerialMismatchSnafu {
            ledger_serial: record.serial,
            tool_serial,
        }
    );
    info!(common_name, serial = %record.serial, "serial cross-check passed");

    Ok(BuildResult {
        common_name: common_name.to_owned(),
        serial: record.serial.clone(),
        request_path,
        certificate_path,
        key_path: layout.private_key_path(common_name),
        pem_path: layout.serial_pem_path(&record.serial),
    })
}

/// Renders the issuance command line.
///
/// With default options this is exactly
/// `cd <root> && ./easyrsa --batch build-client-full <name> nopass`.
fn issuance_command(authority_root: &Path, common_name: &str, options: &IssueOptions) -> String {
    let mut command = format!("cd {} && ", authority_root.display());
    for (key, value) in options.env_assignments() {
        command.push_str(&format!("{key}={value} "));
    }
    command.push_str(&format!("./easyrsa --batch build-client-full {common_name} nopass"));
    command
}

/// Asks `openssl` for the serial of the certificate file on disk.
async fn query_certificate_serial(
    executor: &dyn CommandExecutor,
    certificate_path: &Path,
    cancel: &CancellationToken,
) -> Result<String> {
    let command = format!("openssl x509 -in {} -serial -noout", certificate_path.display());
    let output = executor.run_shell(&command, cancel).await?;

    if !output.success() {
        return error::SerialQuerySnafu {
            reason: format!(
                "openssl exited with code {}: {}",
                output.exit_code,
                output.stderr.trim()
            ),
        }
        .fail();
    }

    // Expected output: `serial=ABCD1234`.
    output
        .stdout
        .split_once('=')
        .map(|(_, value)| value.trim().to_owned())
        .filter(|serial| !serial.is_empty())
        .context(error::SerialQuerySnafu {
            reason: format!("unexpected openssl output: {:?}", output.stdout.trim()),
        })
}
