//! Plaintext credential files.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;
use zeroize::Zeroizing;

use super::{read_optional, write_file};
use crate::core::constants::{
    ALIAS_MARKER, ALIAS_TARGET_EXTENSION, DEFAULT_FILE_MODE, SECRET_FILE_MODE,
};
use crate::core::fingerprint::fingerprint;
use crate::error::CredentialError;

/// Raw bytes of a credential as stored on local disk.
///
/// The content is wiped from memory on drop.
pub struct PlaintextAsset {
    path: PathBuf,
    content: Zeroizing<Vec<u8>>,
}

impl fmt::Debug for PlaintextAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaintextAsset")
            .field("path", &self.path)
            .field("len", &self.content.len())
            .finish()
    }
}

impl PlaintextAsset {
    /// Wrap in-memory content destined for `path`. Nothing is written.
    pub fn new(path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: Zeroizing::new(content.into()),
        }
    }

    /// Load the file at `path`, materializing it from `default` if absent.
    ///
    /// An existing file always wins over `default`. A default of the form
    /// `<<<other.pem` copies the content of `other.pem` (resolved relative
    /// to the directory of `path`); any other default is written verbatim.
    ///
    /// # Errors
    ///
    /// - `MissingRequiredFile` if the file is absent and there is no default.
    /// - `MissingAliasTarget` if the alias target is absent too.
    /// - `Read` / `Persist` for any other filesystem failure.
    pub fn load_or_create(path: &Path, default: Option<&str>) -> Result<Self, CredentialError> {
        if let Some(bytes) = read_optional(path).map_err(|source| CredentialError::Read {
            path: path.to_path_buf(),
            source,
        })? {
            return Ok(Self::new(path, bytes));
        }

        let Some(default) = default else {
            return Err(CredentialError::MissingRequiredFile {
                path: path.to_path_buf(),
            });
        };

        if let Some(target) = alias_target(path, default) {
            debug!(path = %path.display(), target = %target.display(), "materializing alias");
            let source = match Self::load_or_create(&target, None) {
                Ok(asset) => asset,
                Err(e) if e.is_not_found() => {
                    return Err(CredentialError::MissingAliasTarget {
                        path: path.to_path_buf(),
                        target,
                    })
                }
                Err(e) => return Err(e),
            };
            write_file(path, source.bytes(), SECRET_FILE_MODE).map_err(|source| {
                CredentialError::Persist {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
            return Ok(Self::new(path, source.bytes().to_vec()));
        }

        debug!(path = %path.display(), "writing default value");
        write_file(path, default.as_bytes(), DEFAULT_FILE_MODE).map_err(|source| {
            CredentialError::Persist {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Self::load_or_create(path, None)
    }

    /// Fingerprint of the current in-memory content.
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.content)
    }

    /// Write the content to disk with mode 0600.
    ///
    /// # Errors
    ///
    /// Returns `EmptyContent` without touching the disk if the content is
    /// empty, or `Persist` if the write fails.
    pub fn persist(&self) -> Result<(), CredentialError> {
        if self.content.is_empty() {
            return Err(CredentialError::EmptyContent {
                path: self.path.clone(),
            });
        }
        write_file(&self.path, &self.content, SECRET_FILE_MODE).map_err(|source| {
            CredentialError::Persist {
                path: self.path.clone(),
                source,
            }
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> &[u8] {
        &self.content
    }
}

/// Resolve `<<<target.pem` defaults.
fn alias_target(path: &Path, default: &str) -> Option<PathBuf> {
    let target = default.strip_prefix(ALIAS_MARKER)?;
    if target.len() <= ALIAS_TARGET_EXTENSION.len() || !target.ends_with(ALIAS_TARGET_EXTENSION) {
        return None;
    }
    let target = Path::new(target);
    if target.is_absolute() {
        return Some(target.to_path_buf());
    }
    Some(match path.parent() {
        Some(dir) => dir.join(target),
        None => target.to_path_buf(),
    })
}
