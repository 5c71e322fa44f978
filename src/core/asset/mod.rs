//! Credential assets on disk.
//!
//! A credential lives as up to three sibling files:
//!
//! ```text
//! credentials/
//! ├── apiserver.pem              # plaintext (PlaintextAsset)
//! ├── apiserver.pem.enc          # ciphertext (EncryptedAsset)
//! └── apiserver.pem.fingerprint  # SHA-256 of the plaintext that produced .enc
//! ```

mod encrypted;
mod plaintext;

pub use encrypted::EncryptedAsset;
pub use plaintext::PlaintextAsset;

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Append `.<suffix>` to a path without touching its existing extension.
pub(crate) fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s = OsString::from(path.as_os_str());
    s.push(".");
    s.push(suffix);
    PathBuf::from(s)
}

/// Write `bytes` to `path` atomically with the given mode.
///
/// The content goes to a temp file in the same directory which is then
/// renamed over `path`, so a failed write leaves the previous file intact.
pub(crate) fn write_file(path: &Path, bytes: &[u8], mode: u32) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(tmp.path(), fs::Permissions::from_mode(mode))?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Read a file, mapping "does not exist" to `None`.
pub(crate) fn read_optional(path: &Path) -> io::Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
