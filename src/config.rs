//! Runtime configuration for the CLI.
//!
//! Flags win over environment variables; the PKI directory defaults to
//! `<authority_root>/pki` when neither source names one.

use std::path::PathBuf;

use snafu::OptionExt;
use snafu::ResultExt;
use snafu::Snafu;

/// Environment variable naming the authority root directory.
pub const AUTHORITY_ROOT_ENV: &str = "CERTGATE_AUTHORITY_ROOT";

/// Environment variable overriding the PKI directory.
pub const PKI_DIR_ENV: &str = "CERTGATE_PKI_DIR";

/// Environment variable setting the default CRL validity in days.
pub const CRL_DAYS_ENV: &str = "CERTGATE_CRL_DAYS";

/// Errors resolving the runtime configuration.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    /// No authority root from flags or environment.
    #[snafu(display("Authority root not configured: pass --authority-root or set {AUTHORITY_ROOT_ENV}"))]
    MissingAuthorityRoot,

    /// A numeric setting did not parse.
    #[snafu(display("Invalid value {value:?} for {name}: {source}"))]
    InvalidNumber {
        /// Environment variable that held the value.
        name: &'static str,
        /// The unparseable text.
        value: String,
        /// Underlying parse error.
        source: std::num::ParseIntError,
    },
}

/// Resolved settings the CLI passes into the lifecycle service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertgateConfig {
    /// Directory containing the `easyrsa` script and `pki/` state.
    pub authority_root: PathBuf,
    /// Directory holding the authority ledger.
    pub pki_dir: PathBuf,
    /// Default CRL validity in days, when configured.
    pub crl_days: Option<u32>,
}

impl CertgateConfig {
    /// Resolves configuration from explicit values and the process environment.
    ///
    /// Explicit values (CLI flags) take precedence over environment
    /// variables.
    pub fn resolve(
        authority_root: Option<PathBuf>,
        pki_dir: Option<PathBuf>,
        crl_days: Option<u32>,
    ) -> Result<Self, ConfigError> {
        Self::resolve_with(authority_root, pki_dir, crl_days, |name| std::env::var(name).ok())
    }

    fn resolve_with(
        authority_root: Option<PathBuf>,
        pki_dir: Option<PathBuf>,
        crl_days: Option<u32>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let authority_root = authority_root
            .or_else(|| lookup(AUTHORITY_ROOT_ENV).map(PathBuf::from))
            .context(MissingAuthorityRootSnafu)?;

        let pki_dir = pki_dir
            .or_else(|| lookup(PKI_DIR_ENV).map(PathBuf::from))
            .unwrap_or_else(|| authority_root.join("pki"));

        let crl_days = match crl_days {
            Some(days) => Some(days),
            None => match lookup(CRL_DAYS_ENV) {
                Some(value) => Some(
                    value
                        .parse()
                        .context(InvalidNumberSnafu { name: CRL_DAYS_ENV, value })?,
                ),
                None => None,
            },
        };

        Ok(Self {
            authority_root,
            pki_dir,
            crl_days,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn explicit_values_win_over_environment() {
        let lookup = |name: &str| match name {
            AUTHORITY_ROOT_ENV => Some("/env/root".to_string()),
            PKI_DIR_ENV => Some("/env/pki".to_string()),
            CRL_DAYS_ENV => Some("10".to_string()),
            _ => None,
        };

        let config = CertgateConfig::resolve_with(
            Some(PathBuf::from("/flag/root")),
            Some(PathBuf::from("/flag/pki")),
            Some(30),
            lookup,
        )
        .unwrap();

        assert_eq!(config.authority_root, PathBuf::from("/flag/root"));
        assert_eq!(config.pki_dir, PathBuf::from("/flag/pki"));
        assert_eq!(config.crl_days, Some(30));
    }

    #[test]
    fn environment_fills_missing_values() {
        let lookup = |name: &str| match name {
            AUTHORITY_ROOT_ENV => Some("/env/root".to_string()),
            CRL_DAYS_ENV => Some("10".to_string()),
            _ => None,
        };

        let config = CertgateConfig::resolve_with(None, None, None, lookup).unwrap();

        assert_eq!(config.authority_root, PathBuf::from("/env/root"));
        assert_eq!(config.pki_dir, PathBuf::from("/env/root/pki"));
        assert_eq!(config.crl_days, Some(10));
    }

    #[test]
    fn pki_dir_defaults_under_authority_root() {
        let config =
            CertgateConfig::resolve_with(Some(PathBuf::from("/opt/authority")), None, None, no_env)
                .unwrap();
        assert_eq!(config.pki_dir, PathBuf::from("/opt/authority/pki"));
        assert_eq!(config.crl_days, None);
    }

    #[test]
    fn missing_authority_root_is_an_error() {
        let err = CertgateConfig::resolve_with(None, None, None, no_env).unwrap_err();
        assert!(matches!(err, ConfigError::MissingAuthorityRoot));
    }

    #[test]
    fn unparseable_crl_days_is_an_error() {
        let lookup = |name: &str| match name {
            AUTHORITY_ROOT_ENV => Some("/env/root".to_string()),
            CRL_DAYS_ENV => Some("soon".to_string()),
            _ => None,
        };

        let err = CertgateConfig::resolve_with(None, None, None, lookup).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { .. }));
    }
}
