//! Encrypted credential cache reconciliation.
//!
//! KMS ciphertext differs on every call, and these ciphertexts end up in
//! node user-data. Re-encrypting on every run would change user-data even
//! when no credential changed and force node replacement. The [`Store`]
//! therefore only re-encrypts when the plaintext fingerprint no longer
//! matches the one saved next to the cached ciphertext.
//!
//! ## Decision table
//!
//! | plaintext            | cache       | result                         |
//! |----------------------|-------------|--------------------------------|
//! | missing              | missing     | error                          |
//! | present              | missing     | encrypt, persist               |
//! | present, same fp     | present     | cache as-is                    |
//! | present, other fp    | present     | re-encrypt, persist            |
//! | missing              | present     | cache as-is                    |
//! | unreadable           | any         | error                          |

mod status;

pub use status::{inspect, CacheReport, CacheState};

use std::path::Path;

use tracing::{debug, info};

use crate::core::asset::{EncryptedAsset, PlaintextAsset};
use crate::core::cipher::Encryptor;
use crate::error::{CredentialError, Result};

/// Produces up-to-date encrypted credentials with an [`Encryptor`].
#[derive(Debug)]
pub struct Store<E> {
    encryptor: E,
}

impl<E: Encryptor> Store<E> {
    pub fn new(encryptor: E) -> Self {
        Self { encryptor }
    }

    pub fn encryptor(&self) -> &E {
        &self.encryptor
    }

    /// Return the encrypted form of the credential at `path`, reusing the
    /// cached ciphertext whenever the plaintext has not changed.
    ///
    /// `default` materializes a missing plaintext (see
    /// [`PlaintextAsset::load_or_create`]). Fresh ciphertext is persisted
    /// before it is returned.
    ///
    /// # Errors
    ///
    /// - neither plaintext nor cache exists
    /// - the plaintext could not be read for a reason other than absence
    /// - encryption or persisting the new cache entry failed
    pub fn encrypted_credential_from_path(
        &self,
        path: &Path,
        default: Option<&str>,
    ) -> Result<EncryptedAsset> {
        let raw = PlaintextAsset::load_or_create(path, default);
        let cached = EncryptedAsset::load_from_path(path, raw.is_ok());

        match (raw, cached) {
            (Err(raw_err), Err(CredentialError::CacheMissing { .. })) => Err(raw_err.into()),

            (Ok(raw), Err(CredentialError::CacheMissing { .. })) => {
                debug!(path = %path.display(), "no encrypted cache, encrypting");
                Ok(EncryptedAsset::create_from_plaintext(&raw, &self.encryptor)?)
            }

            (Err(raw_err), _) if !raw_err.is_not_found() => Err(raw_err.into()),

            (_, Err(cache_err)) => Err(cache_err.into()),

            (Ok(raw), Ok(cache)) => {
                if cache.fingerprint() == Some(raw.fingerprint().as_str()) {
                    debug!(path = %path.display(), "encrypted cache is up to date");
                    return Ok(cache);
                }
                info!(path = %path.display(), "plaintext changed, regenerating encrypted cache");
                Ok(EncryptedAsset::create_from_plaintext(&raw, &self.encryptor)?)
            }

            (Err(_), Ok(cache)) => {
                debug!(path = %path.display(), "plaintext missing, using encrypted cache");
                Ok(cache)
            }
        }
    }
}
