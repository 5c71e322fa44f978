//! Test support utilities for kube-aws integration tests.
//!
//! Provides reusable test environment setup and helper commands.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;
pub mod fixtures;
pub mod skip;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Test environment with an isolated project directory.
///
/// Child processes run with `.current_dir()` set to the project, so the
/// default `credentials/` directory resolves inside it and tests can run
/// in parallel.
pub struct Test {
    /// Temporary directory for the test project
    pub dir: TempDir,
}

impl Test {
    /// Create a new empty test environment with an empty credentials dir.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        fs::create_dir_all(dir.path().join("credentials")).expect("failed to create credentials dir");
        Self { dir }
    }

    /// Create a test environment with a rendered credential set.
    pub fn rendered() -> Self {
        let t = Self::new();
        let output = t.render(&["--generate-ca"]);
        assert!(
            output.status.success(),
            "Failed to render credentials: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        t
    }

    /// The credentials directory.
    pub fn creds(&self) -> PathBuf {
        self.dir.path().join("credentials")
    }

    /// Path of `name` inside the credentials directory.
    pub fn cred(&self, name: &str) -> PathBuf {
        self.creds().join(name)
    }

    /// Write a credential file.
    pub fn write(&self, name: &str, content: impl AsRef<[u8]>) {
        fs::write(self.cred(name), content).expect("failed to write credential");
    }

    /// Read a credential file.
    pub fn read(&self, name: &str) -> Vec<u8> {
        fs::read(self.cred(name)).unwrap_or_else(|e| panic!("failed to read {}: {}", name, e))
    }

    /// Read a credential file as a string.
    pub fn read_string(&self, name: &str) -> String {
        String::from_utf8(self.read(name)).expect("credential is not utf-8")
    }

    /// Write `kube-aws.toml` in the project root.
    pub fn write_config(&self, content: &str) {
        fs::write(self.dir.path().join("kube-aws.toml"), content).expect("failed to write config");
    }

    pub fn exists(&self, name: &str) -> bool {
        self.cred(name).exists()
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}
