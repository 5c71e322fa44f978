//! Default credential set for a cluster.

use std::path::{Path, PathBuf};

use tracing::info;

use super::{KeyPair, KeyPairFactory, KeyPairSpec, Usage};
use crate::core::config::PkiConfig;
use crate::error::{CredentialError, Result};

const CA: &str = "ca";

/// How `render credentials` treats existing files.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Create a CA when none exists
    pub generate_ca: bool,
    /// Import an existing CA certificate
    pub ca_cert_path: Option<PathBuf>,
    /// Import an existing CA key
    pub ca_key_path: Option<PathBuf>,
    /// Regenerate pairs that already exist
    pub force: bool,
}

/// Outcome for one key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    pub name: String,
    pub created: bool,
}

/// Renders every key pair a cluster needs into a credentials directory.
#[derive(Debug)]
pub struct Generator<'a> {
    dir: &'a Path,
    config: &'a PkiConfig,
}

impl<'a> Generator<'a> {
    pub fn new(dir: &'a Path, config: &'a PkiConfig) -> Self {
        Self { dir, config }
    }

    /// Specs for the CA and every leaf pair, CA first.
    pub fn specs(&self) -> Result<Vec<KeyPairSpec>> {
        let cfg = self.config;
        let leaf = |name: &str, cn: &str, usages: &[Usage]| KeyPairSpec {
            name: name.to_string(),
            common_name: cn.to_string(),
            organization: None,
            dns_names: Vec::new(),
            ip_addresses: Vec::new(),
            usages: usages.to_vec(),
            validity_days: cfg.validity_days,
            signer: Some(CA.to_string()),
        };
        let both = [Usage::Server, Usage::Client];

        let ca = KeyPairSpec {
            name: CA.to_string(),
            common_name: "kube-ca".to_string(),
            organization: Some(cfg.organization.clone()),
            dns_names: Vec::new(),
            ip_addresses: Vec::new(),
            usages: Vec::new(),
            validity_days: cfg.ca_validity_days,
            signer: None,
        };

        let mut apiserver = leaf("apiserver", "kube-apiserver", &both);
        apiserver.dns_names = [
            "kubernetes",
            "kubernetes.default",
            "kubernetes.default.svc",
            "kubernetes.default.svc.cluster.local",
        ]
        .iter()
        .map(|s| s.to_string())
        .chain(cfg.api_endpoint_dns_names.iter().cloned())
        .collect();
        apiserver.ip_addresses = vec![cfg.service_ip()?];

        let mut worker = leaf("worker", "kube-worker", &both);
        worker.dns_names = vec![
            "*.*.compute.internal".to_string(),
            "*.ec2.internal".to_string(),
        ];

        let mut etcd = leaf("etcd", "kube-etcd", &both);
        etcd.dns_names = cfg
            .etcd_dns_names
            .iter()
            .cloned()
            .chain(["*.*.compute.internal".to_string(), "*.ec2.internal".to_string()])
            .collect();

        let mut admin = leaf("admin", "kube-admin", &[Usage::Client]);
        admin.organization = Some("system:masters".to_string());

        Ok(vec![
            ca,
            apiserver,
            leaf(
                "kube-controller-manager",
                "system:kube-controller-manager",
                &[Usage::Client],
            ),
            leaf("kube-scheduler", "system:kube-scheduler", &[Usage::Client]),
            worker,
            admin,
            etcd,
            leaf("etcd-client", "kube-etcd-client", &[Usage::Client]),
            leaf("apiserver-aggregator", "aggregator", &[Usage::Client]),
        ])
    }

    /// Generate missing key pairs through `factory`.
    ///
    /// The CA is imported from `ca_cert_path`/`ca_key_path`, reused from the
    /// directory, or generated when `generate_ca` (or `force`) is set. A new
    /// CA invalidates every leaf, so all of them are regenerated.
    pub fn generate(
        &self,
        factory: &dyn KeyPairFactory,
        opts: &GenerateOptions,
    ) -> Result<Vec<Generated>> {
        std::fs::create_dir_all(self.dir).map_err(|source| CredentialError::Persist {
            path: self.dir.to_path_buf(),
            source,
        })?;

        let specs = self.specs()?;
        let (ca_spec, leaves) = specs.split_first().ok_or_else(|| {
            CredentialError::InvariantViolation("generator produced no specs".to_string())
        })?;

        let (ca, ca_created) = self.ensure_ca(factory, ca_spec, opts)?;
        let mut outcomes = vec![Generated {
            name: ca_spec.name.clone(),
            created: ca_created,
        }];

        for spec in leaves {
            let exists = KeyPair::load(self.dir, &spec.name)?.is_some();
            let created = !exists || opts.force || ca_created;
            if created {
                factory.create_key_pair(self.dir, spec, Some(&ca))?;
            }
            outcomes.push(Generated {
                name: spec.name.clone(),
                created,
            });
        }

        info!(
            dir = %self.dir.display(),
            created = outcomes.iter().filter(|g| g.created).count(),
            "credentials rendered"
        );
        Ok(outcomes)
    }

    fn ensure_ca(
        &self,
        factory: &dyn KeyPairFactory,
        spec: &KeyPairSpec,
        opts: &GenerateOptions,
    ) -> Result<(KeyPair, bool)> {
        if let (Some(cert), Some(key)) = (&opts.ca_cert_path, &opts.ca_key_path) {
            let ca = KeyPair::load_files(cert, key)?.ok_or_else(|| {
                CredentialError::MissingRequiredFile {
                    path: cert.clone(),
                }
            })?;
            let existing = KeyPair::load(self.dir, CA)?;
            let changed = existing.map_or(true, |e| e.cert_pem != ca.cert_pem);
            if changed {
                ca.persist(self.dir, CA)?;
            }
            return Ok((ca, changed));
        }

        if !opts.force {
            if let Some(ca) = KeyPair::load(self.dir, CA)? {
                return Ok((ca, false));
            }
        }

        if !opts.generate_ca && !opts.force {
            return Err(CredentialError::MissingRequiredFile {
                path: self.dir.join(spec.cert_file()),
            }
            .into());
        }

        Ok((factory.create_key_pair(self.dir, spec, None)?, true))
    }
}
