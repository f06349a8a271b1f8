//! Line-level decoding of `index.txt`.

use std::path::Path;

use chrono::DateTime;
use chrono::NaiveDate;
use chrono::Utc;
use snafu::OptionExt;
use snafu::ResultExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::CancelledSnafu;
use crate::error::InvalidDateFormatSnafu;
use crate::error::IoSnafu;
use crate::error::Result;
use crate::record::CertificateRecord;
use crate::record::CertificateStatus;

/// File name of the authority ledger inside the PKI directory.
pub const LEDGER_FILE_NAME: &str = "index.txt";

/// Minimum tab-separated fields for a line to be decoded at all.
const MIN_FIELDS: usize = 6;

/// Prefix of the subject column when it carries only a common name.
const CN_PREFIX: &str = "/CN=";

/// Parses the ledger found in `pki_dir` (its `index.txt` file).
pub async fn parse_ledger_dir(
    pki_dir: &Path,
    cancel: &CancellationToken,
) -> Result<Vec<CertificateRecord>> {
    parse_ledger_file(&pki_dir.join(LEDGER_FILE_NAME), cancel).await
}

/// Parses one ledger file into records, preserving file order.
///
/// Cancellation is checked before the read and between lines, so a scan of a
/// large database stops promptly once the caller gives up on it.
pub async fn parse_ledger_file(
    path: &Path,
    cancel: &CancellationToken,
) -> Result<Vec<CertificateRecord>> {
    if cancel.is_cancelled() {
        return CancelledSnafu.fail();
    }

    let contents = tokio::fs::read_to_string(path).await.context(IoSnafu { path })?;

    let mut records = Vec::new();
    for line in contents.lines() {
        if cancel.is_cancelled() {
            return CancelledSnafu.fail();
        }
        if let Some(record) = parse_line(line)? {
            records.push(record);
        }
    }

    debug!(path = %path.display(), records = records.len(), "parsed authority ledger");
    Ok(records)
}

/// Decodes a single ledger line.
///
/// Returns `Ok(None)` for lines too short to be a record. Field contents are
/// taken verbatim; only the subject column has its `/CN=` prefix stripped.
fn parse_line(line: &str) -> Result<Option<CertificateRecord>> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < MIN_FIELDS {
        return Ok(None);
    }

    let status = CertificateStatus::from_code(fields[0]);
    let expires_at = parse_utc_timestamp(fields[1])?;
    let revoked_at = match fields[2] {
        "" => None,
        value => Some(parse_utc_timestamp(value)?),
    };
    let common_name = fields[5].strip_prefix(CN_PREFIX).unwrap_or(fields[5]).to_owned();

    Ok(Some(CertificateRecord {
        status,
        expires_at,
        revoked_at,
        serial: fields[3].to_owned(),
        reserved: fields[4].to_owned(),
        common_name,
    }))
}

/// Parses a ledger timestamp in the strict `YYMMDDHHMMSSZ` grammar.
///
/// Exactly twelve ASCII digits followed by a literal `Z`. Two-digit years
/// follow the UTCTime pivot: 00-49 map to 20xx, 50-99 map to 19xx. Anything
/// else, including calendar-invalid dates, is rejected.
pub fn parse_utc_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let digits = value
        .strip_suffix('Z')
        .filter(|d| d.len() == 12 && d.bytes().all(|b| b.is_ascii_digit()))
        .context(InvalidDateFormatSnafu { value })?;

    // All bytes are validated ASCII digits, so the folds below are exact.
    let num = |s: &str| s.bytes().fold(0u32, |acc, b| acc * 10 + u32::from(b - b'0'));

    let yy = num(&digits[0..2]) as i32;
    let year = if yy < 50 { 2000 + yy } else { 1900 + yy };

    NaiveDate::from_ymd_opt(year, num(&digits[2..4]), num(&digits[4..6]))
        .and_then(|date| date.and_hms_opt(num(&digits[6..8]), num(&digits[8..10]), num(&digits[10..12])))
        .map(|naive| naive.and_utc())
        .context(InvalidDateFormatSnafu { value })
}
