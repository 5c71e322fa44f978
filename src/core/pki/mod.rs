//! Certificate and key generation.
//!
//! ```text
//! pki/
//! ├── mod        # KeyPairSpec, KeyPair, Pki, KeyPairFactory
//! ├── protected  # ProtectedPki: Pki + encrypted cache
//! └── generator  # default spec set for a cluster
//! ```

mod generator;
mod protected;

pub use generator::{GenerateOptions, Generated, Generator};
pub use protected::{EncryptedKeyPair, ProtectedPki};

use std::fmt;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose,
    IsCa, Issuer, KeyUsagePurpose,
};
use time::{Duration, OffsetDateTime};
use tracing::debug;
use zeroize::Zeroizing;

use crate::core::asset::{read_optional, PlaintextAsset};
use crate::error::{CredentialError, PkiError, Result};

/// Extended key usage of a leaf certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Usage {
    Server,
    Client,
}

/// Everything needed to generate one certificate and key.
#[derive(Debug, Clone)]
pub struct KeyPairSpec {
    /// File stem: `<name>.pem` and `<name>-key.pem`
    pub name: String,
    pub common_name: String,
    pub organization: Option<String>,
    pub dns_names: Vec<String>,
    pub ip_addresses: Vec<IpAddr>,
    pub usages: Vec<Usage>,
    pub validity_days: u32,
    /// Name of the signing key pair; `None` for a self-signed CA
    pub signer: Option<String>,
}

impl KeyPairSpec {
    pub fn cert_file(&self) -> String {
        format!("{}.pem", self.name)
    }

    pub fn key_file(&self) -> String {
        format!("{}-key.pem", self.name)
    }
}

/// PEM-encoded certificate and private key.
pub struct KeyPair {
    pub cert_pem: String,
    pub key_pem: Zeroizing<String>,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("cert_pem", &self.cert_pem)
            .finish_non_exhaustive()
    }
}

impl KeyPair {
    /// Load `<name>.pem` and `<name>-key.pem` from `dir`.
    ///
    /// Returns `None` unless both files exist.
    pub fn load(dir: &Path, name: &str) -> Result<Option<Self>> {
        let cert = dir.join(format!("{}.pem", name));
        let key = dir.join(format!("{}-key.pem", name));
        Self::load_files(&cert, &key)
    }

    /// Load a certificate and key from explicit paths.
    pub fn load_files(cert: &Path, key: &Path) -> Result<Option<Self>> {
        let read = |p: &Path| {
            read_optional(p).map_err(|source| CredentialError::Read {
                path: p.to_path_buf(),
                source,
            })
        };
        let (Some(cert_pem), Some(key_pem)) = (read(cert)?, read(key)?) else {
            return Ok(None);
        };

        let utf8 = |p: &Path, bytes: Vec<u8>| {
            String::from_utf8(bytes).map_err(|_| PkiError::Signer {
                path: p.to_path_buf(),
                reason: "not valid UTF-8 PEM".to_string(),
            })
        };
        Ok(Some(Self {
            cert_pem: utf8(cert, cert_pem)?,
            key_pem: Zeroizing::new(utf8(key, key_pem)?),
        }))
    }

    /// Write both files into `dir` with mode 0600.
    pub fn persist(&self, dir: &Path, name: &str) -> Result<(PathBuf, PathBuf)> {
        let cert = dir.join(format!("{}.pem", name));
        let key = dir.join(format!("{}-key.pem", name));
        PlaintextAsset::new(&cert, self.cert_pem.as_bytes()).persist()?;
        PlaintextAsset::new(&key, self.key_pem.as_bytes()).persist()?;
        Ok((cert, key))
    }
}

/// Creates key pairs and puts them in a credentials directory.
pub trait KeyPairFactory {
    /// Generate the pair described by `spec`, signed by `signer` (or
    /// self-signed when `None`), and store it in `dir`.
    fn create_key_pair(
        &self,
        dir: &Path,
        spec: &KeyPairSpec,
        signer: Option<&KeyPair>,
    ) -> Result<KeyPair>;
}

/// ECDSA P-256 certificate authority and leaf generation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pki;

impl Pki {
    /// Generate a self-signed CA.
    pub fn generate_ca(&self, spec: &KeyPairSpec) -> std::result::Result<KeyPair, PkiError> {
        let mut params = base_params(spec)?;
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];

        let key = rcgen::KeyPair::generate()?;
        let cert = params.self_signed(&key)?;
        debug!(name = %spec.name, "generated CA");

        Ok(KeyPair {
            cert_pem: cert.pem(),
            key_pem: Zeroizing::new(key.serialize_pem()),
        })
    }

    /// Generate a leaf certificate signed by `signer`.
    pub fn generate_key_pair(
        &self,
        spec: &KeyPairSpec,
        signer: &KeyPair,
    ) -> std::result::Result<KeyPair, PkiError> {
        let signer_path = PathBuf::from(format!(
            "{}.pem",
            spec.signer.as_deref().unwrap_or("ca")
        ));
        let signer_error = |e: rcgen::Error| PkiError::Signer {
            path: signer_path.clone(),
            reason: e.to_string(),
        };
        let signer_key = rcgen::KeyPair::from_pem(&signer.key_pem).map_err(signer_error)?;
        let issuer =
            Issuer::from_ca_cert_pem(&signer.cert_pem, signer_key).map_err(signer_error)?;

        let mut params = base_params(spec)?;
        params.key_usages = vec![
            KeyUsagePurpose::DigitalSignature,
            KeyUsagePurpose::KeyEncipherment,
        ];
        params.extended_key_usages = spec
            .usages
            .iter()
            .map(|u| match u {
                Usage::Server => ExtendedKeyUsagePurpose::ServerAuth,
                Usage::Client => ExtendedKeyUsagePurpose::ClientAuth,
            })
            .collect();

        let key = rcgen::KeyPair::generate()?;
        let cert = params.signed_by(&key, &issuer)?;
        debug!(name = %spec.name, "generated key pair");

        Ok(KeyPair {
            cert_pem: cert.pem(),
            key_pem: Zeroizing::new(key.serialize_pem()),
        })
    }

    fn generate(
        &self,
        spec: &KeyPairSpec,
        signer: Option<&KeyPair>,
    ) -> std::result::Result<KeyPair, PkiError> {
        match signer {
            Some(signer) => self.generate_key_pair(spec, signer),
            None => self.generate_ca(spec),
        }
    }
}

impl KeyPairFactory for Pki {
    fn create_key_pair(
        &self,
        dir: &Path,
        spec: &KeyPairSpec,
        signer: Option<&KeyPair>,
    ) -> Result<KeyPair> {
        let pair = self.generate(spec, signer)?;
        pair.persist(dir, &spec.name)?;
        Ok(pair)
    }
}

fn base_params(spec: &KeyPairSpec) -> std::result::Result<CertificateParams, PkiError> {
    let mut sans = spec.dns_names.clone();
    sans.extend(spec.ip_addresses.iter().map(|ip| ip.to_string()));
    let mut params = CertificateParams::new(sans)?;

    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, spec.common_name.clone());
    if let Some(org) = &spec.organization {
        dn.push(DnType::OrganizationName, org.clone());
    }
    params.distinguished_name = dn;

    let now = OffsetDateTime::now_utc();
    params.not_before = now - Duration::minutes(5);
    params.not_after = now + Duration::days(i64::from(spec.validity_days));
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::credentials::certificate_not_after;
    use tempfile::TempDir;

    fn ca_spec() -> KeyPairSpec {
        KeyPairSpec {
            name: "ca".to_string(),
            common_name: "kube-ca".to_string(),
            organization: Some("kube-aws".to_string()),
            dns_names: Vec::new(),
            ip_addresses: Vec::new(),
            usages: Vec::new(),
            validity_days: 10,
            signer: None,
        }
    }

    fn leaf_spec() -> KeyPairSpec {
        KeyPairSpec {
            name: "apiserver".to_string(),
            common_name: "kube-apiserver".to_string(),
            organization: None,
            dns_names: vec!["kubernetes".to_string()],
            ip_addresses: vec!["10.3.0.1".parse().unwrap()],
            usages: vec![Usage::Server, Usage::Client],
            validity_days: 5,
            signer: Some("ca".to_string()),
        }
    }

    #[test]
    fn test_spec_file_names() {
        let spec = leaf_spec();
        assert_eq!(spec.cert_file(), "apiserver.pem");
        assert_eq!(spec.key_file(), "apiserver-key.pem");
    }

    #[test]
    fn test_generate_ca_and_leaf() {
        let pki = Pki;
        let ca = pki.generate_ca(&ca_spec()).unwrap();
        assert!(ca.cert_pem.starts_with("-----BEGIN CERTIFICATE-----"));
        assert!(ca.key_pem.contains("PRIVATE KEY"));

        let leaf = pki.generate_key_pair(&leaf_spec(), &ca).unwrap();
        assert_ne!(leaf.cert_pem, ca.cert_pem);
    }

    #[test]
    fn test_leaf_with_garbage_signer() {
        let signer = KeyPair {
            cert_pem: "nope".to_string(),
            key_pem: Zeroizing::new("nope".to_string()),
        };
        let err = Pki.generate_key_pair(&leaf_spec(), &signer).unwrap_err();
        assert!(matches!(err, PkiError::Signer { .. }));
    }

    #[test]
    fn test_create_key_pair_persists_and_reloads() {
        let dir = TempDir::new().unwrap();
        let ca = Pki.create_key_pair(dir.path(), &ca_spec(), None).unwrap();

        let loaded = KeyPair::load(dir.path(), "ca").unwrap().unwrap();
        assert_eq!(loaded.cert_pem, ca.cert_pem);
        assert_eq!(*loaded.key_pem, *ca.key_pem);
    }

    #[test]
    fn test_validity_is_applied() {
        let dir = TempDir::new().unwrap();
        Pki.create_key_pair(dir.path(), &ca_spec(), None).unwrap();

        let not_after = certificate_not_after(&dir.path().join("ca.pem"))
            .unwrap()
            .unwrap();
        let days = (not_after - chrono::Utc::now()).num_days();
        assert!((9..=10).contains(&days), "unexpected validity {}", days);
    }

    #[test]
    fn test_load_requires_both_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("ca.pem"), "CERT").unwrap();
        assert!(KeyPair::load(dir.path(), "ca").unwrap().is_none());
    }
}
