//! Filesystem layout of an EasyRSA authority.
//!
//! EasyRSA keeps all state under `<authority_root>/pki/` with fixed
//! subdirectory names. Centralizing the joins here keeps the workflows free
//! of string-pasted paths and gives tests one place to build expectations.

use std::path::Path;
use std::path::PathBuf;

/// Path builder for one authority's on-disk state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkiLayout {
    pki_dir: PathBuf,
}

impl PkiLayout {
    /// Layout rooted at `<authority_root>/pki`.
    pub fn new(authority_root: &Path) -> Self {
        Self {
            pki_dir: authority_root.join("pki"),
        }
    }

    /// Layout over an explicit PKI directory.
    pub fn from_pki_dir(pki_dir: impl Into<PathBuf>) -> Self {
        Self {
            pki_dir: pki_dir.into(),
        }
    }

    /// The PKI state directory itself.
    pub fn pki_dir(&self) -> &Path {
        &self.pki_dir
    }

    /// The authority ledger: `pki/index.txt`.
    pub fn index_path(&self) -> PathBuf {
        self.pki_dir.join(certgate_ledger::LEDGER_FILE_NAME)
    }

    /// Certificate signing request: `pki/reqs/<name>.req`.
    pub fn request_path(&self, common_name: &str) -> PathBuf {
        self.pki_dir.join("reqs").join(format!("{common_name}.req"))
    }

    /// Issued certificate: `pki/issued/<name>.crt`.
    pub fn issued_cert_path(&self, common_name: &str) -> PathBuf {
        self.pki_dir.join("issued").join(format!("{common_name}.crt"))
    }

    /// Private key: `pki/private/<name>.key`.
    pub fn private_key_path(&self, common_name: &str) -> PathBuf {
        self.pki_dir.join("private").join(format!("{common_name}.key"))
    }

    /// Serial-indexed certificate copy: `pki/certs_by_serial/<serial>.pem`.
    pub fn serial_pem_path(&self, serial: &str) -> PathBuf {
        self.pki_dir.join("certs_by_serial").join(format!("{serial}.pem"))
    }

    /// Certificate revocation list: `pki/crl.pem`.
    pub fn crl_path(&self) -> PathBuf {
        self.pki_dir.join("crl.pem")
    }
}
