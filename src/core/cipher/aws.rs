//! AWS KMS service.
//!
//! Enable with `--features aws` (on by default).
//!
//! Uses AWS credentials from the environment (AWS_ACCESS_KEY_ID, etc.)
//! or from the default credential provider chain.

use std::fmt;

use aws_sdk_kms::config::Region;
use aws_sdk_kms::primitives::Blob;
use tracing::debug;

use super::KmsEncryptionService;
use crate::error::CipherError;

/// AWS KMS client plus the runtime that drives it.
///
/// One instance is created per run and reused for every credential.
pub struct AwsKms {
    runtime: tokio::runtime::Runtime,
    client: aws_sdk_kms::Client,
}

impl fmt::Debug for AwsKms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsKms").finish_non_exhaustive()
    }
}

impl AwsKms {
    /// Load AWS configuration and build a KMS client.
    ///
    /// `region` overrides the region from the environment.
    pub fn connect(region: Option<&str>) -> Result<Self, CipherError> {
        // The AWS SDK is async; drive it from a private current-thread runtime
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                CipherError::EncryptionFailed(format!("failed to create runtime: {}", e))
            })?;

        let client = runtime.block_on(async {
            let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
            if let Some(region) = region {
                loader = loader.region(Region::new(region.to_string()));
            }
            let config = loader.load().await;
            aws_sdk_kms::Client::new(&config)
        });

        debug!(region = ?region, "connected to AWS KMS");
        Ok(Self { runtime, client })
    }
}

impl KmsEncryptionService for AwsKms {
    fn encrypt(&self, key_id: &str, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        self.runtime.block_on(async {
            let result = self
                .client
                .encrypt()
                .key_id(key_id)
                .plaintext(Blob::new(plaintext))
                .send()
                .await
                .map_err(|e| {
                    CipherError::EncryptionFailed(format!(
                        "KMS encrypt failed: {}",
                        aws_sdk_kms::error::DisplayErrorContext(&e)
                    ))
                })?;

            let blob = result
                .ciphertext_blob()
                .ok_or_else(|| CipherError::EncryptionFailed("no ciphertext returned".into()))?;

            Ok(blob.as_ref().to_vec())
        })
    }
}
