//! Terminal output for kube-aws commands.
//!
//! Results go to stdout; errors and hints go to stderr so that
//! `status --json` stays machine-readable. Colors are dropped when
//! `NO_COLOR` is set.

use std::fmt::Display;
use std::io::{self, Write};

use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};

use crate::core::store::CacheState;

const RULE_WIDTH: usize = 56;

fn colors_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

/// Apply `style` to `text` unless colors are disabled.
fn paint(text: &str, style: fn(&str) -> ColoredString) -> String {
    if colors_enabled() {
        style(text).to_string()
    } else {
        text.to_string()
    }
}

/// `✓ generated apiserver`
pub fn success(msg: &str) {
    println!("{} {}", paint("✓", |s| s.green()), msg);
}

/// `✗ required file missing: credentials/ca.pem` (stderr)
pub fn error(msg: &str) {
    eprintln!("{} {}", paint("✗", |s| s.red()), msg);
}

pub fn warn(msg: &str) {
    println!("{} {}", paint("⚠", |s| s.yellow()), msg);
}

/// `✗ invalid certificate credentials/admin.pem: ...` on stdout, for
/// problems a report lists without failing.
pub fn problem(msg: &str) {
    println!("{} {}", paint("✗", |s| s.red()), paint(msg, |s| s.red()));
}

/// `→ run: kube-aws render credentials --generate-ca` (stderr)
pub fn hint(msg: &str) {
    eprintln!("{} {}", paint("→", |s| s.cyan()), paint(msg, |s| s.cyan()));
}

/// Indented `label  value` row.
pub fn kv(label: &str, value: impl Display) {
    println!(
        "  {}  {}",
        paint(label, |s| s.dimmed()),
        paint(&value.to_string(), |s| s.bold())
    );
}

/// Blank line, bold title, rule.
pub fn section(title: &str) {
    println!();
    println!("{}", paint(title, |s| s.bold()));
    println!("{}", paint(&"─".repeat(RULE_WIDTH), |s| s.dimmed()));
}

pub fn path(p: &str) -> String {
    paint(p, |s| s.cyan())
}

pub fn cmd(c: &str) -> String {
    paint(c, |s| s.green())
}

pub fn dimmed(msg: &str) {
    println!("{}", paint(msg, |s| s.dimmed()));
}

/// Start a `Label... ` line; finish it with [`progress_done`].
pub fn progress(label: &str) {
    print!("{}... ", paint(label, |s| s.dimmed()));
    let _ = io::stdout().flush();
}

pub fn progress_done(ok: bool) {
    if ok {
        println!("{}", paint("ok", |s| s.green()));
    } else {
        println!("{}", paint("failed", |s| s.red()));
    }
}

/// Cache state, colored by what the next `encrypt` will do with it.
pub fn cache_state(state: CacheState) -> String {
    let text = state.to_string();
    match state {
        CacheState::Fresh => paint(&text, |s| s.green()),
        CacheState::CacheOnly => text,
        CacheState::Unverified => paint(&text, |s| s.yellow()),
        CacheState::Stale | CacheState::Missing => paint(&text, |s| s.red()),
    }
}

/// `expires 2030-01-01`, or `expired 2001-01-01` in red.
pub fn expiry(not_after: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let date = not_after.format("%Y-%m-%d");
    if not_after < now {
        paint(&format!("expired {}", date), |s| s.red())
    } else {
        paint(&format!("expires {}", date), |s| s.dimmed())
    }
}
