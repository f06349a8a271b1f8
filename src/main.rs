//! certgate command-line interface.
//!
//! Thin adapter over [`CertificateService`]: resolves configuration from
//! flags and environment, wires Ctrl-C to the operation's cancellation
//! token, and prints results as text or JSON.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use certgate::CertificateService;
use certgate::EasyRsaInvoker;
use certgate::IssueOptions;
use certgate::KeyAlgorithm;
use certgate::RevokeOptions;
use certgate::config::CertgateConfig;

#[derive(Parser)]
#[command(name = "certgate", version, about = "Certificate lifecycle engine driving an EasyRSA authority")]
struct Cli {
    /// Directory containing the easyrsa script and pki/ state
    /// (or CERTGATE_AUTHORITY_ROOT).
    #[arg(long, global = true)]
    authority_root: Option<PathBuf>,

    /// Log filter, e.g. `info` or `certgate=debug`.
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Issue a new client certificate.
    Issue(IssueArgs),
    /// Revoke a certificate and regenerate the CRL.
    Revoke(RevokeArgs),
    /// List every certificate in the authority ledger.
    List(ListArgs),
    /// Print the PEM block from a certificate file.
    Pem(PemArgs),
    /// Initialize the pki/ directory if it is missing.
    InitPki,
}

#[derive(Args)]
struct IssueArgs {
    /// Common name for the new certificate.
    common_name: String,

    /// Certificate lifetime in days (EASYRSA_CERT_EXPIRE).
    #[arg(long)]
    expire_days: Option<u32>,

    /// RSA key size in bits (EASYRSA_KEY_SIZE).
    #[arg(long)]
    key_size: Option<u32>,

    /// Digest algorithm, e.g. sha512 (EASYRSA_DIGEST).
    #[arg(long)]
    digest: Option<String>,

    /// Key algorithm (EASYRSA_ALGO).
    #[arg(long, value_parser = ["rsa", "ec"])]
    algo: Option<String>,

    /// EC curve name, e.g. secp384r1 (EASYRSA_CURVE).
    #[arg(long)]
    curve: Option<String>,

    /// Subject alternative name, e.g. DNS:client1.example.com
    /// (EASYRSA_REQ_SAN).
    #[arg(long)]
    san: Option<String>,

    /// Contact email embedded in the request (EASYRSA_REQ_EMAIL).
    #[arg(long)]
    email: Option<String>,

    /// Organizational unit (EASYRSA_REQ_OU).
    #[arg(long)]
    org_unit: Option<String>,
}

#[derive(Args)]
struct RevokeArgs {
    /// Common name of the certificate to revoke.
    common_name: String,

    /// CRL validity in days (EASYRSA_CRL_DAYS, or CERTGATE_CRL_DAYS).
    #[arg(long)]
    crl_days: Option<u32>,
}

#[derive(Args)]
struct ListArgs {
    /// PKI directory to read (defaults to <authority-root>/pki,
    /// or CERTGATE_PKI_DIR).
    #[arg(long)]
    pki_dir: Option<PathBuf>,
}

#[derive(Args)]
struct PemArgs {
    /// Certificate file to read.
    path: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling");
            interrupt.cancel();
        }
    });

    let service = CertificateService::new(Arc::new(EasyRsaInvoker::new()));
    run_command(cli, &service, &cancel).await
}

async fn run_command(
    cli: Cli,
    service: &CertificateService,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let Cli { authority_root, json, command, .. } = cli;

    match command {
        Command::Issue(args) => {
            let config = CertgateConfig::resolve(authority_root, None, None)?;
            let options = IssueOptions {
                cert_expire_days: args.expire_days,
                key_size: args.key_size,
                digest: args.digest,
                algo: parse_algo(args.algo.as_deref())?,
                curve: args.curve,
                san: args.san,
                email: args.email,
                org_unit: args.org_unit,
            };

            let result = service
                .build_certificate(&config.authority_root, &args.common_name, &options, cancel)
                .await
                .context("certificate issuance failed")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("issued {} (serial {})", result.common_name, result.serial);
                println!("certificate: {}", result.certificate_path.display());
                println!("private key: {}", result.key_path.display());
                println!("request:     {}", result.request_path.display());
            }
        }
        Command::Revoke(args) => {
            let config = CertgateConfig::resolve(authority_root, None, args.crl_days)?;
            let options = RevokeOptions { crl_days: config.crl_days };

            let result = service
                .revoke_certificate(&config.authority_root, &args.common_name, &options, cancel)
                .await
                .context("certificate revocation failed")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", result.message);
            }
        }
        Command::List(args) => {
            let config = CertgateConfig::resolve(authority_root, args.pki_dir, None)?;
            let records = service
                .list_certificates(&config.pki_dir, cancel)
                .await
                .context("ledger listing failed")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                for record in &records {
                    println!(
                        "{:8} {:20} {:32} expires {}",
                        record.status,
                        record.serial,
                        record.common_name,
                        record.expires_at.format("%Y-%m-%d")
                    );
                }
            }
        }
        Command::Pem(args) => {
            let pem = service
                .read_certificate_pem(&args.path, cancel)
                .await
                .context("PEM extraction failed")?;
            println!("{pem}");
        }
        Command::InitPki => {
            let config = CertgateConfig::resolve(authority_root, None, None)?;
            let initialized = service
                .init_pki(&config.authority_root, cancel)
                .await
                .context("PKI initialization failed")?;

            if initialized {
                println!("initialized {}", config.authority_root.join("pki").display());
            } else {
                println!("already initialized: {}", config.authority_root.join("pki").display());
            }
        }
    }

    Ok(())
}

fn parse_algo(algo: Option<&str>) -> anyhow::Result<Option<KeyAlgorithm>> {
    Ok(match algo {
        None => None,
        Some("rsa") => Some(KeyAlgorithm::Rsa),
        Some("ec") => Some(KeyAlgorithm::Ec),
        Some(other) => anyhow::bail!("unsupported key algorithm: {other}"),
    })
}
