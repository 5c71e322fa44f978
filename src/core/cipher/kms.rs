//! KMS envelope encryption.

use std::fmt;

use tracing::trace;

use super::Encryptor;
use crate::error::CipherError;

/// A KMS-like service exposing `Encrypt(keyId, plaintext)`.
///
/// Implemented by AWS KMS and by a stub for testing.
pub trait KmsEncryptionService: fmt::Debug {
    fn encrypt(&self, key_id: &str, plaintext: &[u8]) -> Result<Vec<u8>, CipherError>;
}

/// [`Encryptor`] backed by a KMS key.
#[derive(Debug)]
pub struct KmsEncryptor {
    service: Box<dyn KmsEncryptionService>,
    key_arn: String,
}

impl KmsEncryptor {
    /// Encrypt with `key_arn` through `service`.
    pub fn new(service: impl KmsEncryptionService + 'static, key_arn: impl Into<String>) -> Self {
        Self::from_boxed(Box::new(service), key_arn)
    }

    pub fn from_boxed(service: Box<dyn KmsEncryptionService>, key_arn: impl Into<String>) -> Self {
        Self {
            service,
            key_arn: key_arn.into(),
        }
    }

    pub fn key_arn(&self) -> &str {
        &self.key_arn
    }
}

impl Encryptor for KmsEncryptor {
    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        trace!(
            key_id = %self.key_arn,
            plaintext_len = plaintext.len(),
            "encrypting with KMS"
        );
        let ciphertext = self.service.encrypt(&self.key_arn, plaintext)?;
        trace!(ciphertext_len = ciphertext.len(), "encrypted with KMS");
        Ok(ciphertext)
    }
}

/// Open the KMS service compiled into this build.
///
/// The returned handle is reused for every credential in a run.
#[allow(unused_variables)]
pub fn connect(region: Option<&str>) -> Result<Box<dyn KmsEncryptionService>, CipherError> {
    #[cfg(feature = "test-kms")]
    {
        trace!("using stub KMS");
        Ok(Box::new(StubKms::new()))
    }

    #[cfg(all(not(feature = "test-kms"), feature = "aws"))]
    {
        Ok(Box::new(super::aws::AwsKms::connect(region)?))
    }

    #[cfg(all(not(feature = "test-kms"), not(feature = "aws")))]
    {
        Err(CipherError::NotCompiled("AWS"))
    }
}

/// Stub KMS for testing.
///
/// Like real KMS, encrypting the same plaintext twice yields different
/// ciphertext: every call embeds a sequence number. NOT cryptographically
/// secure, just validates the plumbing.
#[cfg(any(test, feature = "test-kms"))]
#[derive(Debug, Clone, Default)]
pub struct StubKms {
    calls: std::sync::Arc<std::sync::atomic::AtomicUsize>,
}

#[cfg(any(test, feature = "test-kms"))]
impl StubKms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `encrypt` calls that reached this stub (shared by clones).
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-kms"))]
impl KmsEncryptionService for StubKms {
    fn encrypt(&self, key_id: &str, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let n = self
            .calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let hex: String = plaintext.iter().map(|b| format!("{:02x}", b)).collect();
        Ok(format!("stub-kms:{}:{}:{}", key_id, n, hex).into_bytes())
    }
}
