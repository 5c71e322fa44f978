//! kube-aws - Kubernetes credentials for AWS clusters.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── render        # Generate certificates and keys
//! │   ├── credentials   # encrypt / status / fingerprint
//! │   └── output        # Terminal output helpers
//! └── core/             # Core library components
//!     ├── config        # kube-aws.toml management
//!     ├── fingerprint   # SHA-256 content fingerprints
//!     ├── asset/        # Plaintext and encrypted credential files
//!     ├── cipher/       # Encryptor trait and KMS backends
//!     ├── store/        # Fingerprint-gated cache reconciliation
//!     ├── credentials   # The cluster's credential set
//!     └── pki/          # Certificate generation
//! ```
//!
//! # Why a cache
//!
//! KMS ciphertext is different on every call. Encrypted credentials end
//! up in node user-data, so re-encrypting unchanged credentials would
//! replace every node on every update. Ciphertext is therefore cached next
//! to the plaintext and only regenerated when the plaintext's SHA-256
//! fingerprint changes.

pub mod cli;
pub mod core;
pub mod error;
