//! Workflow knobs and input validation.
//!
//! Every value here ends up interpolated into a `bash -c` command line, so
//! names and option values are validated against conservative charsets
//! before any command is rendered. EasyRSA reads the knobs as `EASYRSA_*`
//! environment variables; a field left unset keeps the tool's own default.

use snafu::ensure;

use crate::error;
use crate::error::Result;

/// X.509 ub-common-name.
const MAX_COMMON_NAME_LENGTH: usize = 64;

/// Key algorithm for new certificates (`EASYRSA_ALGO`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    /// RSA keys (the tool default).
    Rsa,
    /// Elliptic-curve keys; pair with [`IssueOptions::curve`].
    Ec,
}

impl KeyAlgorithm {
    fn as_env_value(self) -> &'static str {
        match self {
            Self::Rsa => "rsa",
            Self::Ec => "ec",
        }
    }
}

/// Issuance knobs. The default (everything unset) reproduces the stock
/// `./easyrsa --batch build-client-full <name> nopass` invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueOptions {
    /// Certificate lifetime in days (`EASYRSA_CERT_EXPIRE`).
    pub cert_expire_days: Option<u32>,
    /// RSA key size in bits (`EASYRSA_KEY_SIZE`).
    pub key_size: Option<u32>,
    /// Digest algorithm, e.g. `sha512` (`EASYRSA_DIGEST`).
    pub digest: Option<String>,
    /// Key algorithm (`EASYRSA_ALGO`).
    pub algo: Option<KeyAlgorithm>,
    /// EC curve name, e.g. `secp384r1` (`EASYRSA_CURVE`).
    pub curve: Option<String>,
    /// Subject alternative name, e.g. `DNS:client1.example.com`
    /// (`EASYRSA_REQ_SAN`).
    pub san: Option<String>,
    /// Contact email embedded in the request (`EASYRSA_REQ_EMAIL`).
    pub email: Option<String>,
    /// Organizational unit (`EASYRSA_REQ_OU`).
    pub org_unit: Option<String>,
}

impl IssueOptions {
    /// Renders the configured knobs as `VAR=value` pairs, in a fixed order.
    pub(crate) fn env_assignments(&self) -> Vec<(String, String)> {
        let mut env = Vec::new();
        if let Some(days) = self.cert_expire_days {
            env.push(("EASYRSA_CERT_EXPIRE".to_string(), days.to_string()));
        }
        if let Some(bits) = self.key_size {
            env.push(("EASYRSA_KEY_SIZE".to_string(), bits.to_string()));
        }
        if let Some(digest) = &self.digest {
            env.push(("EASYRSA_DIGEST".to_string(), digest.clone()));
        }
        if let Some(algo) = self.algo {
            env.push(("EASYRSA_ALGO".to_string(), algo.as_env_value().to_string()));
        }
        if let Some(curve) = &self.curve {
            env.push(("EASYRSA_CURVE".to_string(), curve.clone()));
        }
        if let Some(san) = &self.san {
            env.push(("EASYRSA_REQ_SAN".to_string(), san.clone()));
        }
        if let Some(email) = &self.email {
            env.push(("EASYRSA_REQ_EMAIL".to_string(), email.clone()));
        }
        if let Some(org_unit) = &self.org_unit {
            env.push(("EASYRSA_REQ_OU".to_string(), org_unit.clone()));
        }
        env
    }

    /// Rejects option values that cannot be passed through the shell safely.
    pub(crate) fn validate(&self) -> Result<()> {
        validate_option_value("EASYRSA_DIGEST", self.digest.as_deref())?;
        validate_option_value("EASYRSA_CURVE", self.curve.as_deref())?;
        validate_option_value("EASYRSA_REQ_SAN", self.san.as_deref())?;
        validate_option_value("EASYRSA_REQ_EMAIL", self.email.as_deref())?;
        validate_option_value("EASYRSA_REQ_OU", self.org_unit.as_deref())?;
        Ok(())
    }
}

/// Revocation knobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RevokeOptions {
    /// CRL validity in days (`EASYRSA_CRL_DAYS`).
    pub crl_days: Option<u32>,
}

/// Validates a name destined for the authority tools and its filesystem.
pub(crate) fn validate_common_name(name: &str) -> Result<()> {
    ensure!(
        !name.is_empty()
            && name.len() <= MAX_COMMON_NAME_LENGTH
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')),
        error::InvalidCommonNameSnafu { name }
    );
    Ok(())
}

fn validate_option_value(name: &'static str, value: Option<&str>) -> Result<()> {
    if let Some(value) = value {
        ensure!(
            !value.is_empty() && value.chars().all(is_safe_option_char),
            error::InvalidOptionSnafu { name, value }
        );
    }
    Ok(())
}

fn is_safe_option_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | ':' | ',' | '-' | '_' | '@' | '/')
}
