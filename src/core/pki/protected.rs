//! Key generation that leaves an encrypted cache behind.

use std::path::Path;

use tracing::debug;

use super::{KeyPair, KeyPairFactory, KeyPairSpec, Pki};
use crate::core::asset::EncryptedAsset;
use crate::core::cipher::Encryptor;
use crate::core::store::Store;
use crate::error::Result;

/// A [`Pki`] paired with a [`Store`].
///
/// Every generated pair is written as plaintext and then reconciled through
/// the store, so the `.enc` and `.fingerprint` files always match the new
/// content.
#[derive(Debug)]
pub struct ProtectedPki<E> {
    store: Store<E>,
    pki: Pki,
}

/// Encrypted cache entries of a freshly generated pair.
#[derive(Debug)]
pub struct EncryptedKeyPair {
    pub cert: EncryptedAsset,
    pub key: EncryptedAsset,
}

impl<E: Encryptor> ProtectedPki<E> {
    pub fn new(encryptor: E, pki: Pki) -> Self {
        Self {
            store: Store::new(encryptor),
            pki,
        }
    }

    pub fn store(&self) -> &Store<E> {
        &self.store
    }

    /// Generate, persist, and encrypt one key pair.
    pub fn create_encrypted_key_pair(
        &self,
        dir: &Path,
        spec: &KeyPairSpec,
        signer: Option<&KeyPair>,
    ) -> Result<(KeyPair, EncryptedKeyPair)> {
        let pair = self.pki.create_key_pair(dir, spec, signer)?;
        let encrypted = self.encrypt_existing(dir, spec)?;
        Ok((pair, encrypted))
    }

    /// Reconcile the cache of a pair that is already on disk.
    pub fn encrypt_existing(&self, dir: &Path, spec: &KeyPairSpec) -> Result<EncryptedKeyPair> {
        let cert = self
            .store
            .encrypted_credential_from_path(&dir.join(spec.cert_file()), None)?;
        let key = self
            .store
            .encrypted_credential_from_path(&dir.join(spec.key_file()), None)?;
        debug!(name = %spec.name, "key pair encrypted");
        Ok(EncryptedKeyPair { cert, key })
    }
}

impl<E: Encryptor> KeyPairFactory for ProtectedPki<E> {
    fn create_key_pair(
        &self,
        dir: &Path,
        spec: &KeyPairSpec,
        signer: Option<&KeyPair>,
    ) -> Result<KeyPair> {
        self.create_encrypted_key_pair(dir, spec, signer)
            .map(|(pair, _)| pair)
    }
}
