//! Command helper methods for Test.

use super::Test;
use assert_cmd::Command;
use std::process::Output;

impl Test {
    /// Create a kube-aws command isolated from the caller's environment.
    ///
    /// Returns a Command configured with:
    /// - Current directory set to the test project directory
    /// - No kube-aws overrides inherited from the environment
    /// - Colors disabled
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("kube-aws").expect("failed to find kube-aws binary");
        cmd.env_remove("KUBE_AWS_CREDENTIALS_DIR")
            .env_remove("KUBE_AWS_KMS_KEY_ARN")
            .env_remove("KUBE_AWS_REGION")
            .env_remove("KUBE_AWS_LOG")
            .env("NO_COLOR", "1");
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Shortcut for `kube-aws render credentials`.
    pub fn render(&self, args: &[&str]) -> Output {
        self.cmd()
            .args(["render", "credentials"])
            .args(args)
            .output()
            .expect("failed to run kube-aws render credentials")
    }

    /// Shortcut for `kube-aws credentials status --json`.
    pub fn status_json(&self) -> serde_json::Value {
        let output = self
            .cmd()
            .args(["credentials", "status", "--json"])
            .output()
            .expect("failed to run kube-aws credentials status");
        assert!(
            output.status.success(),
            "status failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("status output is not JSON")
    }

    /// Cache state reported by `status --json` for one file.
    pub fn cache_state(&self, file: &str) -> String {
        let status = self.status_json();
        status
            .as_array()
            .expect("status is not an array")
            .iter()
            .find(|e| e["file"] == file)
            .unwrap_or_else(|| panic!("{} missing from status", file))["cache"]
            .as_str()
            .expect("cache is not a string")
            .to_string()
    }

    /// Shortcut for `kube-aws credentials encrypt` with a KMS key.
    pub fn encrypt(&self) -> Output {
        self.cmd()
            .args(["credentials", "encrypt", "--kms-key-arn", super::TEST_KMS_KEY_ARN])
            .output()
            .expect("failed to run kube-aws credentials encrypt")
    }

    /// Shortcut for `kube-aws credentials fingerprint <path>`.
    pub fn fingerprint(&self, path: &str) -> Output {
        self.cmd()
            .args(["credentials", "fingerprint", path])
            .output()
            .expect("failed to run kube-aws credentials fingerprint")
    }
}
