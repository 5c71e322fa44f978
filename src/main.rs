//! kube-aws - Kubernetes credentials for AWS clusters.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use kube_aws::cli::output;
use kube_aws::cli::{execute, Cli};
use kube_aws::core::constants::LOG_ENV;
use kube_aws::error::{ConfigError, CredentialError, Error};

fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber with env-filter support
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("kube_aws=debug")
        } else {
            EnvFilter::new("kube_aws=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .init();

    if let Err(e) = execute(cli) {
        // Format error with suggestion if available
        let suggestion = match &e {
            Error::Credential(CredentialError::MissingRequiredFile { path })
                if path.ends_with("ca.pem") =>
            {
                Some("run: kube-aws render credentials --generate-ca")
            }
            Error::Credential(CredentialError::Expired { .. }) => {
                Some("run: kube-aws render credentials --force")
            }
            Error::Config(ConfigError::MissingField {
                field: "credentials.kms_key_arn",
            }) => Some("pass --kms-key-arn or set credentials.kms_key_arn in kube-aws.toml"),
            _ => None,
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}
