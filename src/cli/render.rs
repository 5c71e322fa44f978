//! `render credentials` command.

use crate::cli::output;
use crate::core::config::Config;
use crate::core::credentials::read_or_encrypt_assets;
use crate::core::pki::{GenerateOptions, Generated, Generator, Pki, ProtectedPki};
use crate::error::Result;

/// Generate missing key pairs, optionally encrypting the whole set.
pub fn credentials(config: &Config, opts: &GenerateOptions, encrypt: bool) -> Result<()> {
    let dir = &config.credentials.dir;
    let generator = Generator::new(dir, &config.pki);

    if !encrypt {
        let outcomes = generator.generate(&Pki, opts)?;
        report(&outcomes);
        println!();
        output::hint(&format!(
            "Encrypt them with {}",
            output::cmd("kube-aws credentials encrypt")
        ));
        return Ok(());
    }

    let protected = ProtectedPki::new(super::kms_encryptor(config)?, Pki);
    let outcomes = generator.generate(&protected, opts)?;
    report(&outcomes);

    // Kept pairs and non-PKI secrets still need a cache entry
    let assets = read_or_encrypt_assets(dir, protected.store())?;
    output::success(&format!("{} credentials encrypted", assets.len()));
    Ok(())
}

fn report(outcomes: &[Generated]) {
    for g in outcomes {
        if g.created {
            output::success(&format!("generated {}", g.name));
        } else {
            output::dimmed(&format!("  kept {}", g.name));
        }
    }
}
