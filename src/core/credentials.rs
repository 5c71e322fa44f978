//! The cluster's credential set.
//!
//! Every file a cluster needs is listed in [`CREDENTIALS`].
//! [`read_or_encrypt_assets`] walks the list and asks the [`Store`] for an
//! up-to-date encrypted copy of each one.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use x509_cert::der::DecodePem;
use x509_cert::Certificate;

use crate::core::asset::{read_optional, EncryptedAsset};
use crate::core::cipher::Encryptor;
use crate::core::store::Store;
use crate::error::{CredentialError, Result};

/// What a credential file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// PEM certificate, checked for expiry.
    Certificate,
    /// PEM private key.
    Key,
    /// Anything else (token files, encryption config).
    Secret,
}

/// One entry of the credential set.
#[derive(Debug, Clone, Copy)]
pub struct Credential {
    /// File name inside the credentials directory.
    pub file: &'static str,
    pub kind: Kind,
    /// Materializes a missing plaintext; `<<<x.pem` aliases another file.
    pub default: Option<&'static str>,
}

const fn required(file: &'static str, kind: Kind) -> Credential {
    Credential {
        file,
        kind,
        default: None,
    }
}

const fn defaulted(file: &'static str, kind: Kind, default: &'static str) -> Credential {
    Credential {
        file,
        kind,
        default: Some(default),
    }
}

/// Every credential file, in reconciliation order.
pub const CREDENTIALS: &[Credential] = &[
    required("ca.pem", Kind::Certificate),
    required("ca-key.pem", Kind::Key),
    required("apiserver.pem", Kind::Certificate),
    required("apiserver-key.pem", Kind::Key),
    required("kube-controller-manager.pem", Kind::Certificate),
    required("kube-controller-manager-key.pem", Kind::Key),
    required("kube-scheduler.pem", Kind::Certificate),
    required("kube-scheduler-key.pem", Kind::Key),
    required("worker.pem", Kind::Certificate),
    required("worker-key.pem", Kind::Key),
    required("admin.pem", Kind::Certificate),
    required("admin-key.pem", Kind::Key),
    required("etcd.pem", Kind::Certificate),
    required("etcd-key.pem", Kind::Key),
    required("etcd-client.pem", Kind::Certificate),
    required("etcd-client-key.pem", Kind::Key),
    required("apiserver-aggregator.pem", Kind::Certificate),
    required("apiserver-aggregator-key.pem", Kind::Key),
    defaulted("service-account-key.pem", Kind::Key, "<<<apiserver-key.pem"),
    defaulted("etcd-trusted-ca.pem", Kind::Certificate, "<<<ca.pem"),
    defaulted("worker-ca.pem", Kind::Certificate, "<<<ca.pem"),
    defaulted("worker-ca-key.pem", Kind::Key, "<<<ca-key.pem"),
    defaulted("kiam-ca.pem", Kind::Certificate, ""),
    defaulted("kiam-server.pem", Kind::Certificate, ""),
    defaulted("kiam-server-key.pem", Kind::Key, ""),
    defaulted("kiam-agent.pem", Kind::Certificate, ""),
    defaulted("kiam-agent-key.pem", Kind::Key, ""),
    defaulted("tokens.csv", Kind::Secret, ""),
    defaulted("kubelet-tls-bootstrap-token", Kind::Secret, ""),
    defaulted("encryption-config.yaml", Kind::Secret, ""),
];

/// Encrypted credentials keyed by file name.
#[derive(Debug, Default)]
pub struct EncryptedAssets {
    assets: BTreeMap<String, EncryptedAsset>,
}

impl EncryptedAssets {
    /// Look up an asset that the credential set guarantees to exist.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` if `name` was never reconciled, which
    /// means the caller asked for a file outside [`CREDENTIALS`].
    pub fn find_by_name(&self, name: &str) -> Result<&EncryptedAsset> {
        self.assets.get(name).ok_or_else(|| {
            CredentialError::InvariantViolation(format!("no encrypted asset named {}", name)).into()
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EncryptedAsset)> {
        self.assets.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

/// Reconcile every credential in `dir` and return the encrypted set.
///
/// Expired certificates abort the run before anything is encrypted.
/// Entries are processed one at a time; the first error aborts.
pub fn read_or_encrypt_assets<E: Encryptor>(dir: &Path, store: &Store<E>) -> Result<EncryptedAssets> {
    check_expiry(dir, Utc::now())?;

    let mut assets = EncryptedAssets::default();
    for credential in CREDENTIALS {
        let path = dir.join(credential.file);
        let asset = store.encrypted_credential_from_path(&path, credential.default)?;
        assets.assets.insert(credential.file.to_string(), asset);
    }

    info!(dir = %dir.display(), count = assets.len(), "credentials encrypted");
    Ok(assets)
}

/// Fail if any certificate present in `dir` expired before `now`.
pub fn check_expiry(dir: &Path, now: DateTime<Utc>) -> Result<()> {
    for credential in CREDENTIALS.iter().filter(|c| c.kind == Kind::Certificate) {
        let path = dir.join(credential.file);
        let Some(not_after) = certificate_not_after(&path)? else {
            continue;
        };
        debug!(path = %path.display(), %not_after, "certificate validity");
        if not_after < now {
            return Err(CredentialError::Expired {
                path,
                not_after: not_after.to_rfc3339(),
            }
            .into());
        }
    }
    Ok(())
}

/// `NotAfter` of the first certificate in the PEM file at `path`.
///
/// Returns `None` when the file is absent or empty.
pub fn certificate_not_after(path: &Path) -> Result<Option<DateTime<Utc>>> {
    let bytes = read_optional(path).map_err(|source| CredentialError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let Some(bytes) = bytes.filter(|b| !b.is_empty()) else {
        return Ok(None);
    };

    let cert = Certificate::from_pem(&bytes).map_err(|e| CredentialError::InvalidCertificate {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let not_after = cert.tbs_certificate.validity.not_after.to_system_time();
    Ok(Some(DateTime::<Utc>::from(not_after)))
}
