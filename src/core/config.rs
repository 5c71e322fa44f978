//! Configuration file management.
//!
//! Handles reading and validating `kube-aws.toml`.

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::constants;
use crate::error::{ConfigError, Result};

/// Project configuration stored in `kube-aws.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Where credentials live and how they are encrypted
    #[serde(default)]
    pub credentials: CredentialsConfig,
    /// Certificate generation settings
    #[serde(default)]
    pub pki: PkiConfig,
}

/// `[credentials]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialsConfig {
    /// Credentials directory
    #[serde(default = "default_dir")]
    pub dir: PathBuf,
    /// KMS key used to encrypt credentials.
    ///
    /// `arn:aws:kms:us-west-2:123456789012:key/abc-123`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kms_key_arn: Option<String>,
    /// AWS region of the KMS key (falls back to the AWS environment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            kms_key_arn: None,
            region: None,
        }
    }
}

fn default_dir() -> PathBuf {
    PathBuf::from(constants::CREDENTIALS_DIR)
}

/// `[pki]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PkiConfig {
    pub ca_validity_days: u32,
    pub validity_days: u32,
    pub organization: String,
    /// Extra DNS names for the API server certificate
    pub api_endpoint_dns_names: Vec<String>,
    /// First address of the service CIDR
    pub kubernetes_service_ip: String,
    /// Extra DNS names for the etcd certificate
    pub etcd_dns_names: Vec<String>,
}

impl Default for PkiConfig {
    fn default() -> Self {
        Self {
            ca_validity_days: 3650,
            validity_days: 365,
            organization: "kube-aws".to_string(),
            api_endpoint_dns_names: Vec::new(),
            kubernetes_service_ip: "10.3.0.1".to_string(),
            etcd_dns_names: Vec::new(),
        }
    }
}

impl PkiConfig {
    /// Parsed `kubernetes_service_ip`.
    pub fn service_ip(&self) -> Result<IpAddr> {
        self.kubernetes_service_ip.parse().map_err(|_| {
            ConfigError::InvalidValue {
                field: "pki.kubernetes_service_ip",
                reason: format!("not an IP address: {}", self.kubernetes_service_ip),
            }
            .into()
        })
    }
}

impl Config {
    /// Default path of the configuration file
    pub fn config_path() -> PathBuf {
        PathBuf::from(constants::CONFIG_FILE)
    }

    /// Load configuration.
    ///
    /// With `path = None` the default `kube-aws.toml` is read if present;
    /// otherwise defaults apply. An explicit path must exist.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadFile` if an explicit file is missing,
    /// `ConfigError::Parse` if the TOML is malformed, or a validation error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (Self::config_path(), false),
        };
        debug!(path = %path.display(), "loading config");

        if !explicit && !path.exists() {
            debug!("no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::ReadFile {
            path: path.clone(),
            source,
        })?;
        let config = Self::parse(&contents)?;

        debug!(dir = %config.credentials.dir.display(), "config loaded");
        Ok(config)
    }

    /// Parse and validate TOML content
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// Checks:
    /// - Validity periods are non-zero
    /// - The KMS key, when set, is an AWS KMS ARN
    /// - The Kubernetes service IP parses
    pub fn validate(&self) -> Result<()> {
        if self.pki.ca_validity_days == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pki.ca_validity_days",
                reason: "must be greater than zero".to_string(),
            }
            .into());
        }
        if self.pki.validity_days == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pki.validity_days",
                reason: "must be greater than zero".to_string(),
            }
            .into());
        }
        if let Some(arn) = &self.credentials.kms_key_arn {
            check_kms_key_arn(arn)?;
        }
        self.pki.service_ip()?;
        Ok(())
    }

    /// KMS key ARN, or `MissingField` if encryption was requested without one
    pub fn kms_key_arn(&self) -> Result<&str> {
        self.credentials.kms_key_arn.as_deref().ok_or_else(|| {
            ConfigError::MissingField {
                field: "credentials.kms_key_arn",
            }
            .into()
        })
    }
}

/// Reject anything that is not an `arn:aws:kms:` key or alias ARN.
pub fn check_kms_key_arn(arn: &str) -> Result<()> {
    if !arn.starts_with("arn:aws:kms:") {
        return Err(ConfigError::InvalidValue {
            field: "credentials.kms_key_arn",
            reason: format!("expected arn:aws:kms:..., got {}", arn),
        }
        .into());
    }
    Ok(())
}
