//! `credentials` subcommands.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cli::output;
use crate::core::config::Config;
use crate::core::credentials::{certificate_not_after, read_or_encrypt_assets, Kind, CREDENTIALS};
use crate::core::fingerprint::fingerprint as digest;
use crate::core::store::{inspect, CacheState, Store};
use crate::error::{CredentialError, Result};

/// Encrypt the full credential set.
pub fn encrypt(config: &Config) -> Result<()> {
    let dir = &config.credentials.dir;

    // Snapshot before reconciling so the summary can say what changed.
    // Missing and stale entries get new ciphertext, unverified ones a
    // backfilled fingerprint sidecar.
    let pending = CREDENTIALS
        .iter()
        .map(|c| inspect(&dir.join(c.file)))
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .filter(|r| {
            matches!(
                r.state,
                CacheState::Missing | CacheState::Stale | CacheState::Unverified
            )
        })
        .count();

    let store = Store::new(super::kms_encryptor(config)?);
    output::progress("Encrypting credentials");
    let assets = match read_or_encrypt_assets(dir, &store) {
        Ok(assets) => {
            output::progress_done(true);
            assets
        }
        Err(e) => {
            output::progress_done(false);
            return Err(e);
        }
    };

    if pending == 0 {
        output::success(&format!("{} credentials up to date", assets.len()));
    } else {
        output::success(&format!(
            "{} credentials encrypted ({} cache {} written)",
            assets.len(),
            pending,
            if pending == 1 { "entry" } else { "entries" }
        ));
    }
    Ok(())
}

#[derive(Serialize)]
struct StatusEntry {
    file: &'static str,
    path: PathBuf,
    plaintext: bool,
    cache: CacheState,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Show what the next `encrypt` would do for each credential.
pub fn status(config: &Config, json: bool) -> Result<()> {
    let dir = &config.credentials.dir;

    let mut entries = Vec::with_capacity(CREDENTIALS.len());
    for c in CREDENTIALS {
        let report = inspect(&dir.join(c.file))?;
        let (expires, error) = match c.kind {
            Kind::Certificate => match certificate_not_after(&report.path) {
                Ok(not_after) => (not_after, None),
                Err(e) => (None, Some(e.to_string())),
            },
            _ => (None, None),
        };
        entries.push(StatusEntry {
            file: c.file,
            path: report.path,
            plaintext: report.plaintext,
            cache: report.state,
            expires,
            error,
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    output::section("Credentials");
    output::kv("directory", output::path(&dir.display().to_string()));
    println!();

    let now = Utc::now();
    for e in &entries {
        let plaintext = if e.plaintext { "" } else { " (no plaintext)" };
        let expiry = e
            .expires
            .map(|t| format!("  {}", output::expiry(t, now)))
            .unwrap_or_default();
        output::kv(
            &format!("{:<34}", e.file),
            format!("{}{}{}", output::cache_state(e.cache), plaintext, expiry),
        );
    }

    let broken: Vec<_> = entries.iter().filter_map(|e| e.error.as_deref()).collect();
    if !broken.is_empty() {
        println!();
        for msg in &broken {
            output::problem(msg);
        }
    }

    let stale = entries
        .iter()
        .filter(|e| matches!(e.cache, CacheState::Stale | CacheState::Missing))
        .count();
    println!();
    if stale > 0 {
        output::warn(&format!("{} credentials will be (re-)encrypted", stale));
        output::hint(&format!(
            "run: {}",
            output::cmd("kube-aws credentials encrypt")
        ));
    } else {
        output::dimmed("all encrypted credentials are up to date");
    }
    Ok(())
}

/// Print `<sha256>  <path>`.
pub fn fingerprint(path: &Path) -> Result<()> {
    let bytes = std::fs::read(path).map_err(|source| CredentialError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    println!("{}  {}", digest(&bytes), path.display());
    Ok(())
}
