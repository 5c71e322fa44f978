//! Constants used throughout kube-aws.
//!
//! Centralizes magic strings and file modes for the credentials directory.

/// Suffix of the encrypted cache file (`<name>.pem.enc`).
pub const ENCRYPTED_SUFFIX: &str = "enc";

/// Suffix of the fingerprint sidecar (`<name>.pem.fingerprint`).
pub const FINGERPRINT_SUFFIX: &str = "fingerprint";

/// Prefix of a default value that points at another credential file.
pub const ALIAS_MARKER: &str = "<<<";

/// Extension an alias target must carry.
pub const ALIAS_TARGET_EXTENSION: &str = ".pem";

/// Mode for persisted plaintext, ciphertext, and fingerprint files.
pub const SECRET_FILE_MODE: u32 = 0o600;

/// Mode for plaintext materialized from a literal default.
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Configuration file name.
pub const CONFIG_FILE: &str = "kube-aws.toml";

/// Default credentials directory, relative to the working directory.
pub const CREDENTIALS_DIR: &str = "credentials";

/// Environment variable controlling the log filter.
pub const LOG_ENV: &str = "KUBE_AWS_LOG";
