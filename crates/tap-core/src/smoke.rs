//! Post-install smoke test.
//!
//! Runs the installed binary with the formula's test arguments and treats
//! a non-zero exit as failure. Output is captured and logged at debug level.

use std::process::Stdio;

use tap_schema::Formula;
use tokio::process::Command;

use crate::error::InstallError;
use crate::paths::Layout;

/// Run the smoke test of `formula` against its installed binary.
///
/// # Errors
///
/// Returns [`InstallError::NotInstalled`] if the binary is absent,
/// [`InstallError::Io`] if it cannot be spawned, and
/// [`InstallError::TestFailure`] if it exits unsuccessfully.
pub async fn run_test(layout: &Layout, formula: &Formula) -> Result<(), InstallError> {
    let bin = layout.bin().join(formula.test_bin());
    if !bin.is_file() {
        return Err(InstallError::NotInstalled(formula.name().to_string()));
    }

    tracing::debug!("Running {} {:?}", bin.display(), formula.test.args);
    let output = Command::new(&bin)
        .args(&formula.test.args)
        .stdin(Stdio::null())
        .output()
        .await?;

    tracing::debug!("stdout: {}", String::from_utf8_lossy(&output.stdout));
    if !output.stderr.is_empty() {
        tracing::debug!("stderr: {}", String::from_utf8_lossy(&output.stderr));
    }

    if output.status.success() {
        Ok(())
    } else {
        Err(InstallError::TestFailure {
            bin,
            status: output.status,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fn formula(args: &str) -> Formula {
        Formula::parse(&format!(
            r#"
[formula]
name = "proton"
version = "2.0.1"

[[asset]]
os = "linux"
arch = "x86_64"
url = "https://example.com/proton_Linux_x86_64.tar.gz"
sha256 = "5e917e5d22c75dd6362eea013023d353258a52aa5fd55351029abed245d144b9"

[test]
args = [{args}]
"#
        ))
        .unwrap()
    }

    fn install_script(layout: &Layout, body: &str) {
        layout.ensure().unwrap();
        let path = layout.bin().join("proton");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[tokio::test]
    async fn passing_binary() {
        let home = tempfile::tempdir().unwrap();
        let layout = Layout::new(home.path());
        install_script(&layout, "exit 0");

        run_test(&layout, &formula("")).await.unwrap();
    }

    #[tokio::test]
    async fn arguments_are_passed() {
        let home = tempfile::tempdir().unwrap();
        let layout = Layout::new(home.path());
        install_script(&layout, r#"[ "$1" = "--help" ] || exit 7"#);

        run_test(&layout, &formula(r#""--help""#)).await.unwrap();
        let err = run_test(&layout, &formula("")).await.unwrap_err();
        assert!(matches!(err, InstallError::TestFailure { .. }));
    }

    #[tokio::test]
    async fn failing_binary() {
        let home = tempfile::tempdir().unwrap();
        let layout = Layout::new(home.path());
        install_script(&layout, "exit 1");

        let err = run_test(&layout, &formula("")).await.unwrap_err();
        let InstallError::TestFailure { status, .. } = &err else {
            panic!("expected TestFailure, got {err}");
        };
        assert_eq!(status.code(), Some(1));
        assert_eq!(err.exit_code(), 5);
    }

    #[tokio::test]
    async fn missing_binary_is_not_installed() {
        let home = tempfile::tempdir().unwrap();
        let err = run_test(&Layout::new(home.path()), &formula(""))
            .await
            .unwrap_err();
        assert!(matches!(err, InstallError::NotInstalled(_)));
    }
}
