//! Read-only view of the encrypted cache.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::asset::{read_optional, with_suffix};
use crate::core::constants::{ENCRYPTED_SUFFIX, FINGERPRINT_SUFFIX};
use crate::core::fingerprint::fingerprint;
use crate::error::{CredentialError, Result};

/// What the next reconciliation would do with a credential's cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheState {
    /// Fingerprint matches the plaintext; the cache is reused.
    Fresh,
    /// Fingerprint differs; the plaintext will be re-encrypted.
    Stale,
    /// No fingerprint sidecar; it will be backfilled from the plaintext.
    Unverified,
    /// Plaintext is gone; the cache is reused as-is.
    CacheOnly,
    /// No `.enc` file yet.
    Missing,
}

impl fmt::Display for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Fresh => "fresh",
            Self::Stale => "stale",
            Self::Unverified => "unverified",
            Self::CacheOnly => "cache only",
            Self::Missing => "missing",
        };
        f.write_str(s)
    }
}

/// Cache state of one credential file.
#[derive(Debug, Clone, Serialize)]
pub struct CacheReport {
    pub path: PathBuf,
    pub plaintext: bool,
    pub state: CacheState,
}

/// Report the cache state of the credential at `path`.
///
/// Nothing is written: defaults are not materialized and missing
/// fingerprints are not backfilled.
pub fn inspect(path: &Path) -> Result<CacheReport> {
    let read = |p: &Path| {
        read_optional(p).map_err(|source| CredentialError::Read {
            path: p.to_path_buf(),
            source,
        })
    };

    let plaintext = read(path)?;
    let cache = read(&with_suffix(path, ENCRYPTED_SUFFIX))?;
    let stored = read(&with_suffix(path, FINGERPRINT_SUFFIX))?;

    let state = match (&plaintext, cache, stored) {
        (_, None, _) => CacheState::Missing,
        (None, Some(_), _) => CacheState::CacheOnly,
        (Some(_), Some(_), None) => CacheState::Unverified,
        (Some(raw), Some(_), Some(stored)) => {
            if String::from_utf8_lossy(&stored).trim() == fingerprint(raw) {
                CacheState::Fresh
            } else {
                CacheState::Stale
            }
        }
    };

    Ok(CacheReport {
        path: path.to_path_buf(),
        plaintext: plaintext.is_some(),
        state,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_inspect_states() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ca.pem");

        assert_eq!(inspect(&path).unwrap().state, CacheState::Missing);

        fs::write(dir.path().join("ca.pem.enc"), "C").unwrap();
        assert_eq!(inspect(&path).unwrap().state, CacheState::CacheOnly);

        fs::write(&path, "P").unwrap();
        assert_eq!(inspect(&path).unwrap().state, CacheState::Unverified);

        fs::write(dir.path().join("ca.pem.fingerprint"), fingerprint(b"P")).unwrap();
        assert_eq!(inspect(&path).unwrap().state, CacheState::Fresh);

        fs::write(&path, "Q").unwrap();
        let report = inspect(&path).unwrap();
        assert_eq!(report.state, CacheState::Stale);
        assert!(report.plaintext);
    }

    #[test]
    fn test_inspect_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ca.pem");
        fs::write(&path, "P").unwrap();
        fs::write(dir.path().join("ca.pem.enc"), "C").unwrap();

        inspect(&path).unwrap();
        assert!(!dir.path().join("ca.pem.fingerprint").exists());
    }

    #[test]
    fn test_state_serializes_kebab_case() {
        let json = serde_json::to_string(&CacheState::CacheOnly).unwrap();
        assert_eq!(json, "\"cache-only\"");
    }
}
