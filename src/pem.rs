//! PEM certificate block extraction.
//!
//! EasyRSA certificate files carry a human-readable dump of the certificate
//! before the PEM block. Consumers that feed the file to TLS stacks want only
//! the marker-delimited block, so this module cuts it out by line scanning
//! rather than full PEM decoding. The content between the markers is not
//! validated; that is the consumer's job.

use std::path::Path;

use snafu::ResultExt;
use snafu::ensure;
use tokio_util::sync::CancellationToken;

use crate::error;
use crate::error::Result;

const PEM_BEGIN: &str = "-----BEGIN CERTIFICATE-----";
const PEM_END: &str = "-----END CERTIFICATE-----";

/// Reads a certificate file and returns its PEM block.
pub async fn read_certificate_pem(path: &Path, cancel: &CancellationToken) -> Result<String> {
    if cancel.is_cancelled() {
        return error::CancelledSnafu.fail();
    }
    let contents = tokio::fs::read_to_string(path)
        .await
        .context(error::PemReadSnafu { path })?;
    extract_certificate(path, &contents)
}

/// Cuts the PEM block out of certificate file contents.
///
/// The block starts at the first line beginning with the BEGIN marker and
/// runs to the line before the first END marker. The END marker is always
/// appended, so a file truncated mid-block still yields a terminated
/// fragment containing every line that survived. A file with no BEGIN
/// marker has no block to return and is an error.
fn extract_certificate(path: &Path, contents: &str) -> Result<String> {
    let mut lines = Vec::new();
    let mut in_block = false;

    for line in contents.lines() {
        if !in_block {
            if line.starts_with(PEM_BEGIN) {
                in_block = true;
                lines.push(line);
            }
            continue;
        }
        if line.starts_with(PEM_END) {
            break;
        }
        lines.push(line);
    }

    ensure!(in_block, error::PemBeginMarkerMissingSnafu { path });
    lines.push(PEM_END);
    Ok(lines.join("\n"))
}
