//! Encryption backends.
//!
//! Credentials are encrypted through the [`Encryptor`] capability. The only
//! production implementation is [`KmsEncryptor`], which wraps a KMS
//! `Encrypt` call with a fixed key ARN.
//!
//! ## Backends
//!
//! - **AWS KMS**: Feature-gated (`aws`, on by default).
//! - **Stub KMS**: Feature-gated (`test-kms`). Local, non-deterministic,
//!   used by integration tests that drive the binary.
//!
//! ## Adding a New Backend
//!
//! 1. Implement `KmsEncryptionService` (or `Encryptor` directly)
//! 2. Add the implementation in a new file
//! 3. Feature-gate if appropriate
//! 4. Wire it into `kms::connect`
//!
//! Whatever the backend, callers must not rely on ciphertext being
//! deterministic: the credential store decides when to re-encrypt by
//! comparing plaintext fingerprints, never by comparing ciphertexts.

mod kms;

#[cfg(feature = "aws")]
pub mod aws;

pub use kms::{connect, KmsEncryptionService, KmsEncryptor};

#[cfg(any(test, feature = "test-kms"))]
pub use kms::StubKms;

use crate::error::CipherError;

/// Capability to turn plaintext bytes into ciphertext bytes.
pub trait Encryptor {
    /// Encrypt a non-empty plaintext.
    ///
    /// Called by [`Encryptor::encrypted_bytes`], which has already handled
    /// the empty case.
    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError>;

    /// Encrypt `plaintext` in one piece.
    ///
    /// Empty input yields empty output without reaching the backend.
    fn encrypted_bytes(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        if plaintext.is_empty() {
            return Ok(Vec::new());
        }
        self.seal(plaintext)
    }
}

impl<E: Encryptor + ?Sized> Encryptor for Box<E> {
    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        (**self).seal(plaintext)
    }

    fn encrypted_bytes(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        (**self).encrypted_bytes(plaintext)
    }
}
