use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use transit_csr::signing::DEFAULT_MOUNT;
use transit_csr::vault::{DEFAULT_ADDRESS, DEFAULT_TIMEOUT_SECS};
use transit_csr::{KeyHandle, SubjectName, TransitSigner, VaultClient, VaultConfig, build_csr};

#[derive(Parser)]
#[clap(name = "vault-tools", version, about = "Tools backed by Vault's transit engine")]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a certificate signing request signed by a transit key
    Csr(CsrArgs),
}

#[derive(Args)]
struct CsrArgs {
    /// Transit key name
    #[clap(long)]
    name: String,
    /// CSR names JSON file location
    #[clap(long)]
    names: PathBuf,
    #[clap(long, env = "VAULT_ADDR", default_value = DEFAULT_ADDRESS)]
    address: String,
    #[clap(long, env = "VAULT_TOKEN", hide_env_values = true)]
    token: String,
    #[clap(long, env = "VAULT_NAMESPACE")]
    namespace: Option<String>,
    /// Path the transit engine is mounted at
    #[clap(long, default_value = DEFAULT_MOUNT)]
    mount: String,
    /// HTTP request timeout in seconds
    #[clap(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Csr(args) => run_csr(args),
    };

    match result {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            tracing::error!("{error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run_csr(args: CsrArgs) -> Result<String> {
    let subject = SubjectName::from_json_file(&args.names).context("loading CSR names")?;

    let mut config = VaultConfig::new(args.address, args.token).with_timeout(args.timeout);
    if let Some(namespace) = args.namespace {
        config = config.with_namespace(namespace);
    }
    let client = Arc::new(VaultClient::new(config)?);

    let signer = TransitSigner::new(client, KeyHandle::new(&args.name)).with_mount(&args.mount);
    build_csr(&subject, &signer).with_context(|| format!("creating CSR with transit key {}", args.name))
}
