//! Assertions on command output and credential files.

use std::process::Output;

/// Lossy UTF-8 stdout.
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Lossy UTF-8 stderr.
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

pub fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "kube-aws exited with {}:\n{}",
        output.status,
        stderr(output)
    );
}

pub fn assert_failure(output: &Output) {
    assert!(
        !output.status.success(),
        "kube-aws succeeded but was expected to fail:\n{}",
        stdout(output)
    );
}

fn check_stream(stream: &str, text: &str, needle: &str, present: bool) {
    assert_eq!(
        text.contains(needle),
        present,
        "{} {} '{}':\n{}",
        stream,
        if present { "is missing" } else { "should not contain" },
        needle,
        text
    );
}

pub fn assert_stdout_contains(output: &Output, needle: &str) {
    check_stream("stdout", &stdout(output), needle, true);
}

pub fn assert_stderr_contains(output: &Output, needle: &str) {
    check_stream("stderr", &stderr(output), needle, true);
}

pub fn assert_stderr_excludes(output: &Output, needle: &str) {
    check_stream("stderr", &stderr(output), needle, false);
}

/// Assert that a file is only readable by its owner.
#[cfg(unix)]
pub fn assert_owner_only(path: &std::path::Path) {
    use std::os::unix::fs::PermissionsExt;

    let mode = std::fs::metadata(path)
        .unwrap_or_else(|e| panic!("failed to stat {}: {}", path.display(), e))
        .permissions()
        .mode()
        & 0o777;
    assert_eq!(mode, 0o600, "{} has mode {:o}", path.display(), mode);
}
