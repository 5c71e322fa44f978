//! Test fixtures and constants.

use std::cell::Cell;

use kube_aws::core::cipher::Encryptor;
use kube_aws::error::CipherError;

/// A well-formed KMS key ARN. Only the stub KMS ever sees it.
pub const TEST_KMS_KEY_ARN: &str =
    "arn:aws:kms:us-west-2:123456789012:key/00000000-0000-0000-0000-000000000000";

/// Encryptor that appends its own call counter to the plaintext.
///
/// `CERTDATA` encrypts to `CERTDATA0`, then `CERTDATA1`, ... so a test can
/// tell from the cache content whether a new encryption happened.
#[derive(Debug, Default)]
pub struct Counting {
    calls: Cell<usize>,
}

impl Counting {
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl Encryptor for Counting {
    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let n = self.calls.get();
        self.calls.set(n + 1);
        let mut out = plaintext.to_vec();
        out.extend_from_slice(n.to_string().as_bytes());
        Ok(out)
    }
}

/// Self-signed certificate valid between the given dates.
pub fn certificate_pem(not_before: (i32, u8, u8), not_after: (i32, u8, u8)) -> String {
    let mut params =
        rcgen::CertificateParams::new(vec!["test.example".to_string()]).expect("cert params");
    params.not_before = rcgen::date_time_ymd(not_before.0, not_before.1, not_before.2);
    params.not_after = rcgen::date_time_ymd(not_after.0, not_after.1, not_after.2);
    let key = rcgen::KeyPair::generate().expect("key generation");
    params.self_signed(&key).expect("self-signed cert").pem()
}

/// Certificate that expired long ago.
pub fn expired_certificate_pem() -> String {
    certificate_pem((2000, 1, 1), (2001, 1, 1))
}

/// Certificate valid well into the future.
pub fn valid_certificate_pem() -> String {
    certificate_pem((2020, 1, 1), (2099, 1, 1))
}
