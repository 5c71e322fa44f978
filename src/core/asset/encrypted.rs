//! Encrypted credential cache entries.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{read_optional, with_suffix, write_file, PlaintextAsset};
use crate::core::cipher::Encryptor;
use crate::core::constants::{ENCRYPTED_SUFFIX, FINGERPRINT_SUFFIX, SECRET_FILE_MODE};
use crate::error::CredentialError;

/// Ciphertext of a credential plus the fingerprint of the plaintext it was
/// produced from.
///
/// The fingerprint is stored, never derived: this type does not hold the
/// plaintext, and hashing the ciphertext would be meaningless because KMS
/// output differs on every call.
#[derive(Debug, Clone)]
pub struct EncryptedAsset {
    path: PathBuf,
    fingerprint_path: PathBuf,
    content: Vec<u8>,
    fingerprint: Option<String>,
}

impl EncryptedAsset {
    /// Load the cache entry for the plaintext at `path`.
    ///
    /// Reads `<path>.enc` and, when `load_fingerprint` is set,
    /// `<path>.fingerprint`. A cache written before fingerprint sidecars
    /// existed has no sidecar; in that case the fingerprint is backfilled
    /// from the current plaintext at `path` and written out. If the
    /// plaintext is gone as well, the fingerprint stays `None` and nothing
    /// is written.
    ///
    /// # Errors
    ///
    /// Returns `CacheMissing` if there is no `.enc` file, `Read` for any
    /// other read failure (including an unreadable plaintext during
    /// backfill), and `Persist` if the backfill cannot be written.
    pub fn load_from_path(path: &Path, load_fingerprint: bool) -> Result<Self, CredentialError> {
        let enc_path = with_suffix(path, ENCRYPTED_SUFFIX);
        let fingerprint_path = with_suffix(path, FINGERPRINT_SUFFIX);

        let content = read_optional(&enc_path)
            .map_err(|source| CredentialError::Read {
                path: enc_path.clone(),
                source,
            })?
            .ok_or_else(|| CredentialError::CacheMissing {
                path: enc_path.clone(),
            })?;

        let mut asset = Self {
            path: enc_path,
            fingerprint_path,
            content,
            fingerprint: None,
        };
        if !load_fingerprint {
            return Ok(asset);
        }

        let stored = read_optional(&asset.fingerprint_path).map_err(|source| {
            CredentialError::Read {
                path: asset.fingerprint_path.clone(),
                source,
            }
        })?;

        match stored {
            Some(bytes) => {
                let fp = String::from_utf8_lossy(&bytes).trim().to_string();
                asset.fingerprint = (!fp.is_empty()).then_some(fp);
            }
            None => match PlaintextAsset::load_or_create(path, None) {
                Ok(plaintext) => {
                    warn!(
                        path = %asset.fingerprint_path.display(),
                        "fingerprint file missing, backfilling from current plaintext"
                    );
                    asset.fingerprint = Some(plaintext.fingerprint());
                    asset.persist()?;
                }
                Err(e) if e.is_not_found() => {
                    debug!(
                        path = %asset.fingerprint_path.display(),
                        "fingerprint file and plaintext both missing, leaving fingerprint unknown"
                    );
                }
                Err(e) => return Err(e),
            },
        }

        Ok(asset)
    }

    /// Encrypt `plaintext` and persist the result next to it.
    ///
    /// # Errors
    ///
    /// Returns `Encryption` if the encryptor fails and `Persist` if either
    /// file cannot be written.
    pub fn create_from_plaintext<E>(
        plaintext: &PlaintextAsset,
        encryptor: &E,
    ) -> Result<Self, CredentialError>
    where
        E: Encryptor + ?Sized,
    {
        let content = encryptor
            .encrypted_bytes(plaintext.bytes())
            .map_err(|source| CredentialError::Encryption {
                path: plaintext.path().to_path_buf(),
                source,
            })?;

        let asset = Self {
            path: with_suffix(plaintext.path(), ENCRYPTED_SUFFIX),
            fingerprint_path: with_suffix(plaintext.path(), FINGERPRINT_SUFFIX),
            content,
            fingerprint: Some(plaintext.fingerprint()),
        };
        asset.persist()?;

        debug!(path = %asset.path.display(), bytes = asset.content.len(), "encrypted");
        Ok(asset)
    }

    /// Write the ciphertext and, if known, the fingerprint sidecar.
    ///
    /// Each file is replaced atomically. If the sidecar write fails after the
    /// ciphertext was written, the old sidecar no longer matches and the next
    /// reconciliation re-encrypts.
    pub fn persist(&self) -> Result<(), CredentialError> {
        write_file(&self.path, &self.content, SECRET_FILE_MODE).map_err(|source| {
            CredentialError::Persist {
                path: self.path.clone(),
                source,
            }
        })?;

        if let Some(fp) = self.fingerprint.as_deref().filter(|fp| !fp.is_empty()) {
            write_file(&self.fingerprint_path, fp.as_bytes(), SECRET_FILE_MODE).map_err(
                |source| CredentialError::Persist {
                    path: self.fingerprint_path.clone(),
                    source,
                },
            )?;
        }
        Ok(())
    }

    /// Fingerprint of the plaintext this ciphertext came from, if known.
    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.content
    }

    pub fn set_bytes(&mut self, bytes: Vec<u8>) {
        self.content = bytes;
    }

    /// Path of the `.enc` file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the `.fingerprint` sidecar.
    pub fn fingerprint_path(&self) -> &Path {
        &self.fingerprint_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cipher::Encryptor;
    use crate::core::fingerprint::fingerprint;
    use crate::error::CipherError;
    use std::fs;
    use tempfile::TempDir;

    struct Reverse;

    impl Encryptor for Reverse {
        fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
            Ok(plaintext.iter().rev().copied().collect())
        }
    }

    struct Broken;

    impl Encryptor for Broken {
        fn seal(&self, _plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
            Err(CipherError::EncryptionFailed("kms unavailable".into()))
        }
    }

    #[test]
    fn test_create_persists_both_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ca.pem");
        let plaintext = PlaintextAsset::new(&path, "abc");

        let asset = EncryptedAsset::create_from_plaintext(&plaintext, &Reverse).unwrap();
        assert_eq!(asset.bytes(), b"cba");
        assert_eq!(asset.fingerprint(), Some(fingerprint(b"abc").as_str()));
        assert_eq!(fs::read(dir.path().join("ca.pem.enc")).unwrap(), b"cba");
        assert_eq!(
            fs::read_to_string(dir.path().join("ca.pem.fingerprint")).unwrap(),
            fingerprint(b"abc")
        );
    }

    #[test]
    fn test_create_empty_plaintext_is_empty_ciphertext() {
        let dir = TempDir::new().unwrap();
        let plaintext = PlaintextAsset::new(dir.path().join("tokens.csv"), Vec::new());

        let asset = EncryptedAsset::create_from_plaintext(&plaintext, &Broken).unwrap();
        assert!(asset.bytes().is_empty());
        assert!(dir.path().join("tokens.csv.enc").exists());
    }

    #[test]
    fn test_create_wraps_encryption_error() {
        let dir = TempDir::new().unwrap();
        let plaintext = PlaintextAsset::new(dir.path().join("ca.pem"), "abc");

        let err = EncryptedAsset::create_from_plaintext(&plaintext, &Broken).unwrap_err();
        assert!(matches!(err, CredentialError::Encryption { .. }));
        assert!(err.to_string().contains("ca.pem"));
        assert!(!dir.path().join("ca.pem.enc").exists());
    }

    #[test]
    fn test_load_missing_cache() {
        let dir = TempDir::new().unwrap();
        let err = EncryptedAsset::load_from_path(&dir.path().join("ca.pem"), true).unwrap_err();
        assert!(matches!(err, CredentialError::CacheMissing { .. }));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_load_without_fingerprint() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ca.pem");
        fs::write(dir.path().join("ca.pem.enc"), "CIPHER").unwrap();
        fs::write(dir.path().join("ca.pem.fingerprint"), "ff").unwrap();

        let asset = EncryptedAsset::load_from_path(&path, false).unwrap();
        assert_eq!(asset.bytes(), b"CIPHER");
        assert_eq!(asset.fingerprint(), None);
    }

    #[test]
    fn test_load_with_fingerprint() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ca.pem");
        fs::write(dir.path().join("ca.pem.enc"), "CIPHER").unwrap();
        fs::write(dir.path().join("ca.pem.fingerprint"), "abcd\n").unwrap();

        let asset = EncryptedAsset::load_from_path(&path, true).unwrap();
        assert_eq!(asset.fingerprint(), Some("abcd"));
    }

    #[test]
    fn test_load_backfills_missing_fingerprint() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ca.pem");
        fs::write(&path, "PLAIN").unwrap();
        fs::write(dir.path().join("ca.pem.enc"), "CIPHER").unwrap();

        let asset = EncryptedAsset::load_from_path(&path, true).unwrap();
        assert_eq!(asset.fingerprint(), Some(fingerprint(b"PLAIN").as_str()));
        assert_eq!(asset.bytes(), b"CIPHER");
        assert_eq!(
            fs::read_to_string(dir.path().join("ca.pem.fingerprint")).unwrap(),
            fingerprint(b"PLAIN")
        );
    }

    #[test]
    fn test_load_without_sidecar_or_plaintext_leaves_fingerprint_unknown() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ca.pem");
        fs::write(dir.path().join("ca.pem.enc"), "CIPHER").unwrap();

        let asset = EncryptedAsset::load_from_path(&path, true).unwrap();
        assert_eq!(asset.fingerprint(), None);
        assert_eq!(asset.bytes(), b"CIPHER");
        assert!(!dir.path().join("ca.pem.fingerprint").exists());
    }

    #[test]
    fn test_set_bytes_does_not_touch_fingerprint() {
        let dir = TempDir::new().unwrap();
        let plaintext = PlaintextAsset::new(dir.path().join("ca.pem"), "abc");
        let mut asset = EncryptedAsset::create_from_plaintext(&plaintext, &Reverse).unwrap();

        asset.set_bytes(b"other".to_vec());
        assert_eq!(asset.bytes(), b"other");
        assert_eq!(asset.fingerprint(), Some(fingerprint(b"abc").as_str()));
    }
}
