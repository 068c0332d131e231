//! Formula installation.
//!
//! The pipeline is strictly sequential:
//!
//! ```text
//! resolve --> download + verify --> extract --> copy into bin/ --> receipt
//! ```
//!
//! Resolution happens before any filesystem or network access, so an
//! unsupported platform aborts with nothing written and no request sent.
//! Binaries are staged next to their destination and renamed into place,
//! which keeps a failed install from leaving a truncated executable behind.

use std::fs;
use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use reqwest::Client;
use tap_schema::{Formula, FormulaName, InstallRule, Platform};

use crate::error::InstallError;
use crate::io::download::DownloadRequest;
use crate::io::extract::{self, ExtractError, ExtractedFile};
use crate::paths::Layout;
use crate::receipt::Receipt;
use crate::reporter::Reporter;
use crate::resolver;

/// Knobs for a single install.
#[derive(Debug, Clone, Copy)]
pub struct InstallOptions {
    /// Platform to resolve for (normally the host).
    pub platform: Platform,
    /// Reinstall even when an identical install is recorded.
    pub force: bool,
    /// Resolve and report, but download nothing.
    pub dry_run: bool,
}

impl InstallOptions {
    /// Default options for `platform`.
    pub fn for_platform(platform: Platform) -> Self {
        Self {
            platform,
            force: false,
            dry_run: false,
        }
    }
}

/// What an install did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Files were downloaded and written.
    Installed(Receipt),
    /// An identical install was already present; nothing was touched.
    AlreadyInstalled(Receipt),
    /// Dry run: the asset that would have been installed.
    DryRun {
        /// Archive URL.
        url: String,
        /// Expected digest.
        sha256: String,
    },
}

/// Installs, tests and removes formulas under one [`Layout`].
#[derive(Debug)]
pub struct Installer<R: Reporter> {
    client: Client,
    layout: Layout,
    reporter: R,
}

impl<R: Reporter> Installer<R> {
    /// Create an installer with a default HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::DownloadFailure`] if the HTTP client cannot
    /// be initialised (e.g. no TLS backend).
    pub fn new(layout: Layout, reporter: R) -> Result<Self, InstallError> {
        let client = Client::builder()
            .user_agent(crate::USER_AGENT)
            .build()
            .map_err(InstallError::DownloadFailure)?;
        Ok(Self::with_client(client, layout, reporter))
    }

    /// Create an installer around an existing client.
    pub fn with_client(client: Client, layout: Layout, reporter: R) -> Self {
        Self {
            client,
            layout,
            reporter,
        }
    }

    /// Directory layout in use.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Resolve, download, verify, extract and install `formula`.
    ///
    /// # Errors
    ///
    /// - [`InstallError::UnsupportedPlatform`] before any I/O if the formula
    ///   has nothing for `opts.platform`;
    /// - [`InstallError::DownloadFailure`] on network/HTTP errors;
    /// - [`InstallError::ChecksumMismatch`] if the archive digest differs;
    /// - [`InstallError::Extract`] / [`InstallError::MissingBinary`] if the
    ///   archive cannot be unpacked or lacks a file named by an install rule.
    pub async fn install(
        &self,
        formula: &Formula,
        opts: &InstallOptions,
    ) -> Result<InstallOutcome, InstallError> {
        let name = formula.name();
        let version = formula.version();

        let resolution = match resolver::resolve(formula, opts.platform) {
            Ok(r) => r,
            Err(e) => {
                self.reporter.failed(name, version, "unsupported platform");
                return Err(e.into());
            }
        };
        let asset = resolution.asset;
        if let Some(caveat) = resolution.caveat {
            self.reporter.warning(caveat);
        }

        let receipt_path = self.layout.receipt_path(name);
        let previous = Receipt::load(&receipt_path)?;
        let unchanged = previous
            .as_ref()
            .filter(|r| !opts.force && r.is_same_install(version, asset.sha256.as_str()));
        if let Some(existing) = unchanged {
            self.reporter
                .done(name, version, "already installed", Some(existing.size_bytes));
            return Ok(InstallOutcome::AlreadyInstalled(existing.clone()));
        }

        if opts.dry_run {
            self.reporter.info(&format!(
                "(dry run) Would install {name} {version} from {}",
                asset.url
            ));
            self.reporter.done(name, version, "(dry run)", None);
            return Ok(InstallOutcome::DryRun {
                url: asset.url.clone(),
                sha256: asset.sha256.to_string(),
            });
        }

        self.layout.ensure()?;
        let scratch = tempfile::Builder::new()
            .prefix("tap-")
            .tempdir_in(self.layout.tmp())?;

        let archive_name = match asset.filename() {
            "" => "download",
            f => f,
        };
        let archive_path = scratch.path().join(archive_name);

        tracing::info!("Installing {name} {version} for {} from {}", opts.platform, asset.url);
        let sha256 = DownloadRequest {
            client: &self.client,
            name,
            version,
            url: &asset.url,
            dest: &archive_path,
            expected: &asset.sha256,
            reporter: &self.reporter,
        }
        .execute()
        .await?;

        self.reporter.extracting(name, version);
        let extract_dir = scratch.path().join("extract");
        let rules = asset.effective_install(name);
        let bin_dir = self.layout.bin();

        self.reporter.installing(name, version);
        let staged = tokio::task::spawn_blocking(move || {
            let extracted = extract::extract_auto(&archive_path, &extract_dir)?;
            install_files(&extract_dir, &extracted, &bin_dir, &rules)
        })
        .await
        .map_err(std::io::Error::other)??;

        let files: Vec<PathBuf> = staged.iter().map(|(path, _)| path.clone()).collect();
        if let Some(old) = &previous {
            remove_stale(&old.files, &files);
        }

        let receipt = Receipt {
            name: name.clone(),
            version: version.clone(),
            platform: opts.platform,
            asset_platform: asset.platform(),
            url: asset.url.clone(),
            sha256,
            size_bytes: staged.iter().map(|(_, size)| size).sum(),
            files,
            installed_at: Utc::now(),
        };
        receipt.save(&receipt_path)?;

        self.reporter
            .done(name, version, "installed", Some(receipt.size_bytes));
        Ok(InstallOutcome::Installed(receipt))
    }

    /// Run the formula's post-install smoke test.
    ///
    /// # Errors
    ///
    /// See [`crate::smoke::run_test`].
    pub async fn test(&self, formula: &Formula) -> Result<(), InstallError> {
        let result = crate::smoke::run_test(&self.layout, formula).await;
        match &result {
            Ok(()) => self
                .reporter
                .done(formula.name(), formula.version(), "test passed", None),
            Err(e) => self
                .reporter
                .failed(formula.name(), formula.version(), &e.to_string()),
        }
        result
    }

    /// Delete every file recorded for `name`, then its receipt.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::NotInstalled`] if there is no receipt.
    pub fn uninstall(&self, name: &FormulaName) -> Result<Receipt, InstallError> {
        let receipt_path = self.layout.receipt_path(name);
        let receipt = Receipt::load(&receipt_path)?
            .ok_or_else(|| InstallError::NotInstalled(name.to_string()))?;

        self.reporter.removing(&receipt.name, &receipt.version);
        for file in &receipt.files {
            remove_if_exists(file)?;
        }
        remove_if_exists(&receipt_path)?;

        self.reporter
            .done(&receipt.name, &receipt.version, "uninstalled", None);
        Ok(receipt)
    }

    /// Receipt of the installed version of `name`, if any.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the receipt exists but is unreadable.
    pub fn installed(&self, name: &FormulaName) -> Result<Option<Receipt>, InstallError> {
        Ok(Receipt::load(&self.layout.receipt_path(name))?)
    }
}

/// Copy each rule's source out of `extract_dir` into `bin_dir`.
///
/// Sources must be regular files listed in `extracted`. Symlink entries and
/// anything resolving outside `extract_dir` are refused.
///
/// Returns the installed paths with their sizes.
fn install_files(
    extract_dir: &Path,
    extracted: &[ExtractedFile],
    bin_dir: &Path,
    rules: &[InstallRule],
) -> Result<Vec<(PathBuf, u64)>, InstallError> {
    let root = extract_dir.canonicalize()?;
    let mut installed = Vec::with_capacity(rules.len());

    for rule in rules {
        let wanted: PathBuf = Path::new(&rule.from)
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect();
        let entry = extracted
            .iter()
            .find(|f| f.relative_path == wanted)
            .ok_or_else(|| InstallError::MissingBinary(rule.from.clone()))?;

        if entry.is_symlink || !fs::symlink_metadata(&entry.absolute_path)?.is_file() {
            return Err(ExtractError::Archive(format!(
                "'{}' is not a regular file",
                rule.from
            ))
            .into());
        }
        let source = entry.absolute_path.canonicalize()?;
        if !source.starts_with(&root) {
            return Err(ExtractError::Archive(format!(
                "'{}' resolves outside the archive",
                rule.from
            ))
            .into());
        }
        if !entry.is_executable {
            tracing::debug!("{} is not executable in the archive; installing as 0755", rule.from);
        }

        let dest = bin_dir.join(rule.destination());
        let mut staged = tempfile::NamedTempFile::new_in(bin_dir)?;
        let size = std::io::copy(&mut fs::File::open(&source)?, staged.as_file_mut())?;
        staged.as_file().sync_all()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(staged.path(), fs::Permissions::from_mode(0o755))?;
        }

        staged.persist(&dest).map_err(|e| e.error)?;
        tracing::debug!("Installed {} -> {}", rule.from, dest.display());
        installed.push((dest, size));
    }

    Ok(installed)
}

/// Remove files an older install wrote that the new one did not.
fn remove_stale(old: &[PathBuf], new: &[PathBuf]) {
    for path in old.iter().filter(|p| !new.contains(p)) {
        if let Err(e) = remove_if_exists(path) {
            tracing::warn!("Failed to remove stale {}: {e}", path.display());
        }
    }
}

fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::download::sha256_bytes;
    use crate::reporter::{NullReporter, RecordingReporter};
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use mockito::Server;
    use std::sync::Arc;
    use tap_schema::{Arch, Os};

    const SCRIPT: &[u8] = b"#!/bin/sh\nexit 0\n";

    fn tarball(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        for (name, data) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o755);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    fn formula(base_url: &str, version: &str, digest: &str) -> Formula {
        Formula::parse(&format!(
            r#"
[formula]
name = "proton"
version = "{version}"

[[asset]]
os = "linux"
arch = "x86_64"
url = "{base_url}/v{version}/proton_Linux_x86_64.tar.gz"
sha256 = "{digest}"
install = [{{ from = "proton" }}]

[[asset]]
os = "macos"
arch = "x86_64"
url = "{base_url}/v{version}/proton_Darwin_x86_64.tar.gz"
sha256 = "{digest}"

[[fallback]]
os = "macos"
arch = "arm64"
use_arch = "x86_64"
caveat = "The darwin_amd64 binary may work in compatibility mode."
"#
        ))
        .unwrap()
    }

    fn linux() -> InstallOptions {
        InstallOptions::for_platform(Platform::new(Os::Linux, Arch::X86_64))
    }

    #[tokio::test]
    async fn installs_binary_and_writes_receipt() {
        let body = tarball(&[("proton", SCRIPT), ("LICENSE", b"MIT")]);
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v2.0.1/proton_Linux_x86_64.tar.gz")
            .with_status(200)
            .with_body(body.clone())
            .expect(1)
            .create_async()
            .await;

        let home = tempfile::tempdir().unwrap();
        let installer = Installer::new(Layout::new(home.path()), NullReporter).unwrap();
        let f = formula(&server.url(), "2.0.1", &sha256_bytes(&body));

        let outcome = installer.install(&f, &linux()).await.unwrap();
        let InstallOutcome::Installed(receipt) = outcome else {
            panic!("expected a fresh install");
        };

        let bin = home.path().join("bin").join("proton");
        assert_eq!(receipt.files, vec![bin.clone()]);
        assert_eq!(fs::read(&bin).unwrap(), SCRIPT);
        assert!(!home.path().join("bin").join("LICENSE").exists());
        assert!(home.path().join("receipts").join("proton.json").exists());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&bin).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn reinstalling_same_version_is_a_no_op() {
        let body = tarball(&[("proton", SCRIPT)]);
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v2.0.1/proton_Linux_x86_64.tar.gz")
            .with_status(200)
            .with_body(body.clone())
            .expect(1)
            .create_async()
            .await;

        let home = tempfile::tempdir().unwrap();
        let installer = Installer::new(Layout::new(home.path()), NullReporter).unwrap();
        let f = formula(&server.url(), "2.0.1", &sha256_bytes(&body));

        let first = installer.install(&f, &linux()).await.unwrap();
        let second = installer.install(&f, &linux()).await.unwrap();

        let (InstallOutcome::Installed(a), InstallOutcome::AlreadyInstalled(b)) = (first, second)
        else {
            panic!("expected install then no-op");
        };
        assert_eq!(a, b);
        assert_eq!(fs::read(home.path().join("bin/proton")).unwrap(), SCRIPT);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn forced_reinstall_produces_identical_binary() {
        let body = tarball(&[("proton", SCRIPT)]);
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v2.0.1/proton_Linux_x86_64.tar.gz")
            .with_status(200)
            .with_body(body.clone())
            .expect(2)
            .create_async()
            .await;

        let home = tempfile::tempdir().unwrap();
        let installer = Installer::new(Layout::new(home.path()), NullReporter).unwrap();
        let f = formula(&server.url(), "2.0.1", &sha256_bytes(&body));
        let bin = home.path().join("bin/proton");

        installer.install(&f, &linux()).await.unwrap();
        let before = crate::io::download::sha256_file(&bin).unwrap();

        let opts = InstallOptions {
            force: true,
            ..linux()
        };
        let again = installer.install(&f, &opts).await.unwrap();
        assert!(matches!(again, InstallOutcome::Installed(_)));
        assert_eq!(crate::io::download::sha256_file(&bin).unwrap(), before);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unsupported_platform_makes_no_request() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let home = tempfile::tempdir().unwrap();
        let installer = Installer::new(Layout::new(home.path()), NullReporter).unwrap();
        let f = formula(&server.url(), "2.1.0", &"a".repeat(64));

        let opts = InstallOptions::for_platform(Platform::new(Os::Linux, Arch::Arm64));
        let err = installer.install(&f, &opts).await.unwrap_err();

        assert!(matches!(err, InstallError::UnsupportedPlatform(_)));
        assert!(!home.path().join("bin").exists());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn checksum_mismatch_installs_nothing() {
        let body = tarball(&[("proton", SCRIPT)]);
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/v2.0.1/proton_Linux_x86_64.tar.gz")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let home = tempfile::tempdir().unwrap();
        let reporter = Arc::new(RecordingReporter::default());
        let installer =
            Installer::new(Layout::new(home.path()), Arc::clone(&reporter)).unwrap();
        let f = formula(&server.url(), "2.0.1", &sha256_bytes(b"something else"));

        let err = installer.install(&f, &linux()).await.unwrap_err();
        assert!(matches!(err, InstallError::ChecksumMismatch { .. }));
        assert_eq!(reporter.failures(), vec!["hash mismatch".to_string()]);
        assert!(!home.path().join("bin/proton").exists());
        assert!(!home.path().join("receipts/proton.json").exists());
    }

    #[tokio::test]
    async fn http_failure_is_download_failure() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/v2.0.1/proton_Linux_x86_64.tar.gz")
            .with_status(500)
            .create_async()
            .await;

        let home = tempfile::tempdir().unwrap();
        let installer = Installer::new(Layout::new(home.path()), NullReporter).unwrap();
        let f = formula(&server.url(), "2.0.1", &"a".repeat(64));

        let err = installer.install(&f, &linux()).await.unwrap_err();
        assert!(matches!(err, InstallError::DownloadFailure(_)));
        assert_eq!(err.exit_code(), 3);
    }

    #[tokio::test]
    async fn apple_silicon_installs_intel_asset_with_caveat() {
        let body = tarball(&[("proton", SCRIPT)]);
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v2.1.0/proton_Darwin_x86_64.tar.gz")
            .with_status(200)
            .with_body(body.clone())
            .expect(1)
            .create_async()
            .await;

        let home = tempfile::tempdir().unwrap();
        let reporter = Arc::new(RecordingReporter::default());
        let installer =
            Installer::new(Layout::new(home.path()), Arc::clone(&reporter)).unwrap();
        let f = formula(&server.url(), "2.1.0", &sha256_bytes(&body));

        let opts = InstallOptions::for_platform(Platform::new(Os::Macos, Arch::Arm64));
        let InstallOutcome::Installed(receipt) = installer.install(&f, &opts).await.unwrap() else {
            panic!("expected a fresh install");
        };

        assert_eq!(receipt.platform, Platform::new(Os::Macos, Arch::Arm64));
        assert_eq!(receipt.asset_platform, Platform::new(Os::Macos, Arch::X86_64));
        assert_eq!(reporter.warnings().len(), 1);
        assert!(reporter.warnings()[0].contains("compatibility mode"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_binary_in_archive() {
        let body = tarball(&[("README.md", b"docs")]);
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/v2.0.1/proton_Linux_x86_64.tar.gz")
            .with_status(200)
            .with_body(body.clone())
            .create_async()
            .await;

        let home = tempfile::tempdir().unwrap();
        let installer = Installer::new(Layout::new(home.path()), NullReporter).unwrap();
        let f = formula(&server.url(), "2.0.1", &sha256_bytes(&body));

        let err = installer.install(&f, &linux()).await.unwrap_err();
        assert!(matches!(err, InstallError::MissingBinary(ref b) if b == "proton"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlink_entry_is_not_installed() {
        let outside = tempfile::tempdir().unwrap();
        let secret = outside.path().join("secret");
        fs::write(&secret, b"host file").unwrap();

        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Symlink);
        header.set_size(0);
        header.set_mode(0o777);
        builder.append_link(&mut header, "proton", &secret).unwrap();
        let body = builder.into_inner().unwrap().finish().unwrap();

        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/v2.0.1/proton_Linux_x86_64.tar.gz")
            .with_status(200)
            .with_body(body.clone())
            .create_async()
            .await;

        let home = tempfile::tempdir().unwrap();
        let installer = Installer::new(Layout::new(home.path()), NullReporter).unwrap();
        let f = formula(&server.url(), "2.0.1", &sha256_bytes(&body));

        let err = installer.install(&f, &linux()).await.unwrap_err();
        assert!(matches!(err, InstallError::Extract(_)), "{err}");
        assert!(!home.path().join("bin/proton").exists());
        assert!(installer.installed(&FormulaName::new("proton")).unwrap().is_none());
    }

    #[tokio::test]
    async fn dry_run_touches_nothing() {
        let home = tempfile::tempdir().unwrap();
        let installer = Installer::new(Layout::new(home.path()), NullReporter).unwrap();
        let f = formula("https://example.invalid", "2.0.1", &"a".repeat(64));

        let opts = InstallOptions {
            dry_run: true,
            ..linux()
        };
        let outcome = installer.install(&f, &opts).await.unwrap();
        assert!(matches!(outcome, InstallOutcome::DryRun { .. }));
        assert!(!home.path().join("bin").exists());
    }

    #[tokio::test]
    async fn uninstall_removes_recorded_files() {
        let body = tarball(&[("proton", SCRIPT)]);
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/v2.0.1/proton_Linux_x86_64.tar.gz")
            .with_status(200)
            .with_body(body.clone())
            .create_async()
            .await;

        let home = tempfile::tempdir().unwrap();
        let installer = Installer::new(Layout::new(home.path()), NullReporter).unwrap();
        let f = formula(&server.url(), "2.0.1", &sha256_bytes(&body));
        installer.install(&f, &linux()).await.unwrap();

        let name = FormulaName::new("proton");
        let receipt = installer.uninstall(&name).unwrap();
        assert_eq!(receipt.version, "2.0.1");
        assert!(!home.path().join("bin/proton").exists());
        assert!(installer.installed(&name).unwrap().is_none());

        assert!(matches!(
            installer.uninstall(&name),
            Err(InstallError::NotInstalled(_))
        ));
    }
}
