//! Error types.
//!
//! Each concern gets its own enum; all of them fold into [`Error`] so that
//! callers can use `?` across module boundaries.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error returned by every public operation.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Pki(#[from] PkiError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures while reading, caching, or persisting credential assets.
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("required file missing: {}", path.display())]
    MissingRequiredFile { path: PathBuf },

    #[error("{} is aliased to {}, but neither exists", path.display(), target.display())]
    MissingAliasTarget { path: PathBuf, target: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("refusing to persist empty content to {}", path.display())]
    EmptyContent { path: PathBuf },

    #[error("no encrypted cache at {}", path.display())]
    CacheMissing { path: PathBuf },

    #[error("failed to write {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encrypt {}: {source}", path.display())]
    Encryption {
        path: PathBuf,
        #[source]
        source: CipherError,
    },

    #[error("certificate {} expired at {not_after}", path.display())]
    Expired { path: PathBuf, not_after: String },

    #[error("invalid certificate {}: {reason}", path.display())]
    InvalidCertificate { path: PathBuf, reason: String },

    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl CredentialError {
    /// Whether this error means "the file does not exist", as opposed to an
    /// ambiguous read failure such as a permission error.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::MissingRequiredFile { .. }
                | Self::MissingAliasTarget { .. }
                | Self::CacheMissing { .. }
        )
    }
}

/// Failures from an encryption backend.
#[derive(Error, Debug)]
pub enum CipherError {
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("{0} KMS support not compiled. Rebuild with: cargo install kube-aws --features aws")]
    NotCompiled(&'static str),
}

/// Failures while generating certificates and keys.
#[derive(Error, Debug)]
pub enum PkiError {
    #[error("key pair generation failed: {0}")]
    Generation(String),

    #[error("cannot use signer {}: {reason}", path.display())]
    Signer { path: PathBuf, reason: String },
}

impl From<rcgen::Error> for PkiError {
    fn from(e: rcgen::Error) -> Self {
        Self::Generation(e.to_string())
    }
}

/// Failures while loading `kube-aws.toml`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
