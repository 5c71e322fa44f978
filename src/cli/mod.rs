//! Command-line interface.

pub mod credentials;
pub mod output;
pub mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::core::cipher::{self, KmsEncryptor};
use crate::core::config::{self, Config};
use crate::error::Result;

/// kube-aws - Kubernetes credentials for AWS clusters.
#[derive(Parser)]
#[command(
    name = "kube-aws",
    about = "Generate and encrypt Kubernetes credentials for AWS clusters",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to kube-aws.toml
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Credentials directory (overrides the config file)
    #[arg(long, global = true, value_name = "DIR", env = "KUBE_AWS_CREDENTIALS_DIR")]
    pub credentials_dir: Option<PathBuf>,

    /// KMS key ARN used for encryption (overrides the config file)
    #[arg(long, global = true, value_name = "ARN", env = "KUBE_AWS_KMS_KEY_ARN")]
    pub kms_key_arn: Option<String>,

    /// AWS region of the KMS key
    #[arg(long, global = true, env = "KUBE_AWS_REGION")]
    pub region: Option<String>,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Render cluster assets
    Render {
        #[command(subcommand)]
        target: RenderTarget,
    },

    /// Inspect and encrypt credentials
    Credentials {
        #[command(subcommand)]
        action: CredentialsAction,
    },
}

/// Render subcommands.
#[derive(Subcommand)]
pub enum RenderTarget {
    /// Generate the CA, certificates, and keys
    Credentials {
        /// Generate a CA if none exists
        #[arg(long)]
        generate_ca: bool,
        /// Existing CA certificate to sign with
        #[arg(long, requires = "ca_key_path", conflicts_with = "generate_ca")]
        ca_cert_path: Option<PathBuf>,
        /// Existing CA key to sign with
        #[arg(long, requires = "ca_cert_path")]
        ca_key_path: Option<PathBuf>,
        /// Regenerate key pairs that already exist
        #[arg(short, long)]
        force: bool,
        /// Encrypt the credential set afterwards
        #[arg(long)]
        encrypt: bool,
    },
}

/// Credentials subcommands.
#[derive(Subcommand)]
pub enum CredentialsAction {
    /// Encrypt every credential, reusing unchanged ciphertext
    Encrypt,

    /// Show the cache state of every credential
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the SHA-256 fingerprint of a file
    Fingerprint {
        /// File to fingerprint
        path: PathBuf,
    },
}

/// Execute a command.
pub fn execute(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    match cli.command {
        Command::Render {
            target:
                RenderTarget::Credentials {
                    generate_ca,
                    ca_cert_path,
                    ca_key_path,
                    force,
                    encrypt,
                },
        } => {
            let opts = crate::core::pki::GenerateOptions {
                generate_ca,
                ca_cert_path,
                ca_key_path,
                force,
            };
            render::credentials(&config, &opts, encrypt)
        }
        Command::Credentials { action } => match action {
            CredentialsAction::Encrypt => credentials::encrypt(&config),
            CredentialsAction::Status { json } => credentials::status(&config, json),
            CredentialsAction::Fingerprint { path } => credentials::fingerprint(&path),
        },
    }
}

/// Load `kube-aws.toml` and apply command-line overrides.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = &cli.credentials_dir {
        config.credentials.dir = dir.clone();
    }
    if let Some(arn) = &cli.kms_key_arn {
        config::check_kms_key_arn(arn)?;
        config.credentials.kms_key_arn = Some(arn.clone());
    }
    if let Some(region) = &cli.region {
        config.credentials.region = Some(region.clone());
    }
    Ok(config)
}

/// Build the KMS encryptor described by `config`.
pub(crate) fn kms_encryptor(config: &Config) -> Result<KmsEncryptor> {
    let key_arn = config.kms_key_arn()?;
    let service = cipher::connect(config.credentials.region.as_deref())?;
    Ok(KmsEncryptor::from_boxed(service, key_arn))
}
