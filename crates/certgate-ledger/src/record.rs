//! Typed view of one ledger line.

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Lifecycle state of a certificate as recorded by the authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateStatus {
    /// Valid and usable (`V` in the ledger).
    Active,
    /// Revoked by the authority (`R` in the ledger).
    Revoked,
    /// Past its expiry date (`E` in the ledger).
    Expired,
    /// Any status code this parser does not recognize.
    Unknown,
}

impl CertificateStatus {
    /// Maps a ledger status code to a typed status.
    ///
    /// Unrecognized codes map to [`CertificateStatus::Unknown`] rather than
    /// failing: newer EasyRSA releases may add codes, and one odd line must
    /// not hide the rest of the database.
    pub fn from_code(code: &str) -> Self {
        match code {
            "V" => Self::Active,
            "R" => Self::Revoked,
            "E" => Self::Expired,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Active => "active",
            Self::Revoked => "revoked",
            Self::Expired => "expired",
            Self::Unknown => "unknown",
        };
        f.pad(text)
    }
}

/// One issued certificate as recorded in the authority ledger.
///
/// Field order mirrors the `index.txt` columns: status, expiry, revocation,
/// serial, filename (reserved), distinguished name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateRecord {
    /// Recorded lifecycle state.
    pub status: CertificateStatus,
    /// Expiry timestamp (UTC).
    pub expires_at: DateTime<Utc>,
    /// Revocation timestamp (UTC), present only for revoked entries.
    pub revoked_at: Option<DateTime<Utc>>,
    /// Uppercase hex serial number assigned by the authority.
    pub serial: String,
    /// The ledger's filename column, kept verbatim (EasyRSA writes `unknown`).
    pub reserved: String,
    /// Common name with the `/CN=` prefix stripped.
    pub common_name: String,
}

impl CertificateRecord {
    /// True when the authority still considers this certificate valid.
    pub fn is_active(&self) -> bool {
        self.status == CertificateStatus::Active
    }
}
