//! Install receipts.
//!
//! A receipt records what an install wrote so that a repeat install can be
//! recognised as a no-op and an uninstall knows exactly what to delete.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tap_schema::{FormulaName, Platform, Version};

/// One installed formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Formula name.
    pub name: FormulaName,
    /// Installed version.
    pub version: Version,
    /// Platform the install was resolved for.
    pub platform: Platform,
    /// Platform of the asset actually installed (differs under a fallback).
    pub asset_platform: Platform,
    /// Source URL.
    pub url: String,
    /// Verified SHA-256 of the archive.
    pub sha256: String,
    /// Absolute paths written into the binary directory.
    pub files: Vec<PathBuf>,
    /// Total bytes of the installed files.
    pub size_bytes: u64,
    /// When the install finished.
    pub installed_at: DateTime<Utc>,
}

impl Receipt {
    /// Read a receipt, returning `None` when none exists.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> std::io::Result<Option<Self>> {
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content)
                .map(Some)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Write the receipt atomically (temp file + rename).
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the receipt cannot be written.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let dir = path
            .parent()
            .ok_or_else(|| std::io::Error::other("receipt path has no parent"))?;
        std::fs::create_dir_all(dir)?;

        let json = serde_json::to_vec_pretty(self).map_err(std::io::Error::other)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        std::io::Write::write_all(&mut tmp, &json)?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Whether every recorded file is still present.
    pub fn files_present(&self) -> bool {
        self.files.iter().all(|f| f.is_file())
    }

    /// Whether this receipt describes the same install as (`version`, `sha256`).
    pub fn is_same_install(&self, version: &Version, sha256: &str) -> bool {
        &self.version == version && self.sha256.eq_ignore_ascii_case(sha256) && self.files_present()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tap_schema::{Arch, Os};

    fn sample(bin: PathBuf) -> Receipt {
        Receipt {
            name: FormulaName::new("proton"),
            version: Version::new("2.0.1"),
            platform: Platform::new(Os::Linux, Arch::X86_64),
            asset_platform: Platform::new(Os::Linux, Arch::X86_64),
            url: "https://example.com/proton_Linux_x86_64.tar.gz".to_string(),
            sha256: "5e917e5d22c75dd6362eea013023d353258a52aa5fd55351029abed245d144b9".to_string(),
            files: vec![bin],
            size_bytes: 3,
            installed_at: Utc::now(),
        }
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("proton");
        std::fs::write(&bin, b"bin").unwrap();

        let path = dir.path().join("receipts").join("proton.json");
        let receipt = sample(bin);
        receipt.save(&path).unwrap();

        let loaded = Receipt::load(&path).unwrap().unwrap();
        assert_eq!(loaded, receipt);
        assert!(loaded.is_same_install(&Version::new("2.0.1"), &receipt.sha256.to_uppercase()));
        assert!(!loaded.is_same_install(&Version::new("2.1.0"), &receipt.sha256));
    }

    #[test]
    fn missing_receipt_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Receipt::load(&dir.path().join("nope.json")).unwrap().is_none());
    }

    #[test]
    fn deleted_binary_invalidates_receipt() {
        let dir = tempfile::tempdir().unwrap();
        let receipt = sample(dir.path().join("gone"));
        assert!(!receipt.files_present());
        assert!(!receipt.is_same_install(&receipt.version.clone(), &receipt.sha256.clone()));
    }
}
