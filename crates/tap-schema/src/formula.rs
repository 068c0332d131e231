//! Formula documents.
//!
//! A formula is a TOML file describing one published version of a tool:
//! where each platform's release archive lives, the digest it must hash
//! to, and which files inside it land in the binary directory.
//!
//! ```toml
//! [formula]
//! name = "proton"
//! version = "2.0.1"
//! desc = "cli protobuf to json converter"
//! homepage = "https://github.com/beatlabs/proton"
//!
//! [[asset]]
//! os = "macos"
//! arch = "x86_64"
//! url = "https://github.com/beatlabs/proton/releases/download/v2.0.1/proton_Darwin_x86_64.tar.gz"
//! sha256 = "7213d6394b8e5def43a84615c0c4c46f945aca905a8a2af63fdf9a9813edfc6f"
//! install = [{ from = "proton" }]
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hash::Sha256Digest;
use crate::platform::{Arch, Os, Platform};
use crate::types::{FormulaName, Version};

/// Errors that can occur when loading or validating a formula.
#[derive(Error, Debug)]
pub enum FormulaError {
    /// An I/O error occurred while reading a formula file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML content could not be deserialized into a formula.
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// A required field is empty.
    #[error("Empty field: {0}")]
    EmptyField(&'static str),

    /// The download URL is malformed or uses an unsupported scheme.
    #[error("Invalid URL for {platform}: {url}")]
    InvalidUrl {
        /// Platform of the offending asset.
        platform: Platform,
        /// The rejected URL.
        url: String,
    },

    /// Two assets claim the same platform.
    #[error("Duplicate asset for {0}")]
    DuplicatePlatform(Platform),

    /// A fallback is declared for a platform that already has its own asset.
    #[error("Fallback for {0} shadows an existing asset")]
    ShadowedFallback(Platform),

    /// A fallback points at an asset that does not exist.
    #[error("Fallback for {from} targets {to}, which has no asset")]
    DanglingFallback {
        /// Platform the fallback serves.
        from: Platform,
        /// Platform it routes to.
        to: Platform,
    },

    /// An install rule would read or write outside its directory.
    #[error("Invalid install rule for {platform}: {reason}")]
    InvalidInstallRule {
        /// Platform of the offending asset.
        platform: Platform,
        /// What is wrong with the rule.
        reason: String,
    },
}

/// Identity and descriptive metadata of a formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaInfo {
    /// Formula name; also the default installed binary name.
    pub name: FormulaName,
    /// Published version.
    pub version: Version,
    /// One-line description.
    #[serde(default)]
    pub desc: String,
    /// Project homepage.
    #[serde(default)]
    pub homepage: String,
    /// SPDX license identifier, if declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    /// Release tool that generated this formula. Generated formulas are
    /// rendered with a "DO NOT EDIT" banner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_by: Option<String>,
}

/// Maps one file inside the archive to a file in the binary directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallRule {
    /// Path of the file inside the extracted archive.
    pub from: String,
    /// Installed file name; defaults to the file name of `from`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

impl InstallRule {
    /// Rule installing `from` under its own file name.
    pub fn new(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: None,
        }
    }

    /// The installed file name.
    pub fn destination(&self) -> &str {
        self.to.as_deref().unwrap_or_else(|| {
            Path::new(&self.from)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(&self.from)
        })
    }

    fn check(&self) -> Result<(), String> {
        let from = Path::new(&self.from);
        if self.from.is_empty() {
            return Err("empty source path".to_string());
        }
        if !from
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(format!("source '{}' must be a relative path inside the archive", self.from));
        }

        let dest = self.destination();
        if dest.is_empty() || dest == "." || dest == ".." || dest.contains(['/', '\\']) {
            return Err(format!("destination '{dest}' must be a plain file name"));
        }
        Ok(())
    }
}

/// A downloadable archive for one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    /// Target operating system.
    pub os: Os,
    /// Target architecture.
    pub arch: Arch,
    /// Download URL.
    pub url: String,
    /// Expected SHA-256 of the downloaded archive.
    pub sha256: Sha256Digest,
    /// Files to copy into the binary directory. Empty means "the formula name".
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub install: Vec<InstallRule>,
}

impl ReleaseAsset {
    /// The platform this asset serves.
    pub fn platform(&self) -> Platform {
        Platform::new(self.os, self.arch)
    }

    /// Archive file name, taken from the last URL segment.
    pub fn filename(&self) -> &str {
        filename_from_url(&self.url)
    }

    /// Install rules with the formula-name default applied.
    pub fn effective_install(&self, name: &FormulaName) -> Vec<InstallRule> {
        if self.install.is_empty() {
            vec![InstallRule::new(name.as_str())]
        } else {
            self.install.clone()
        }
    }
}

/// Routes a platform without an asset to another architecture's asset.
///
/// This models Apple Silicon running Intel builds in compatibility mode:
/// installation proceeds, and the caveat is shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fallback {
    /// Operating system of the requesting platform.
    pub os: Os,
    /// Architecture of the requesting platform.
    pub arch: Arch,
    /// Architecture whose asset is installed instead (same OS).
    pub use_arch: Arch,
    /// Advisory shown after resolution.
    pub caveat: String,
}

impl Fallback {
    /// The platform that triggers this fallback.
    pub fn platform(&self) -> Platform {
        Platform::new(self.os, self.arch)
    }

    /// The platform whose asset is used.
    pub fn target(&self) -> Platform {
        Platform::new(self.os, self.use_arch)
    }
}

/// Post-install smoke test.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSpec {
    /// Installed binary to run; defaults to the formula name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bin: Option<String>,
    /// Arguments; empty means run with no arguments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

/// A complete formula document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formula {
    /// Identity and metadata.
    pub formula: FormulaInfo,
    /// One asset per supported platform.
    #[serde(default, rename = "asset")]
    pub assets: Vec<ReleaseAsset>,
    /// Compatibility routes for platforms without their own asset.
    #[serde(default, rename = "fallback", skip_serializing_if = "Vec::is_empty")]
    pub fallbacks: Vec<Fallback>,
    /// Post-install smoke test.
    #[serde(default)]
    pub test: TestSpec,
}

impl Formula {
    /// Parse and validate a formula from a TOML file on disk.
    ///
    /// # Errors
    ///
    /// Returns `FormulaError::Io` if the file cannot be read, `FormulaError::Parse`
    /// if the TOML is invalid, or a validation error (see [`Formula::validate`]).
    pub fn from_file(path: &Path) -> Result<Self, FormulaError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate a formula from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `FormulaError::Parse` if the content does not match the schema,
    /// or a validation error (see [`Formula::validate`]).
    pub fn parse(content: &str) -> Result<Self, FormulaError> {
        let formula: Self = toml::from_str(content)?;
        formula.validate()?;
        Ok(formula)
    }

    /// Serialize back to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Check the structural invariants of the document.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant: empty identity fields, non-http
    /// URLs, duplicate platforms, fallbacks that shadow or dangle, and install
    /// rules that escape their directories.
    pub fn validate(&self) -> Result<(), FormulaError> {
        if self.formula.name.is_empty() {
            return Err(FormulaError::EmptyField("name"));
        }
        if self.formula.version.is_empty() {
            return Err(FormulaError::EmptyField("version"));
        }

        let mut seen = HashSet::new();
        for asset in &self.assets {
            let platform = asset.platform();
            if asset.url.is_empty() {
                return Err(FormulaError::EmptyField("url"));
            }
            if !(asset.url.starts_with("https://") || asset.url.starts_with("http://")) {
                return Err(FormulaError::InvalidUrl {
                    platform,
                    url: asset.url.clone(),
                });
            }
            if !seen.insert(platform) {
                return Err(FormulaError::DuplicatePlatform(platform));
            }
            for rule in &asset.install {
                rule.check()
                    .map_err(|reason| FormulaError::InvalidInstallRule { platform, reason })?;
            }
        }

        let mut routed = HashSet::new();
        for fallback in &self.fallbacks {
            let from = fallback.platform();
            if !routed.insert(from) {
                return Err(FormulaError::DuplicatePlatform(from));
            }
            if seen.contains(&from) {
                return Err(FormulaError::ShadowedFallback(from));
            }
            if !seen.contains(&fallback.target()) {
                return Err(FormulaError::DanglingFallback {
                    from,
                    to: fallback.target(),
                });
            }
        }

        Ok(())
    }

    /// Formula name.
    pub fn name(&self) -> &FormulaName {
        &self.formula.name
    }

    /// Formula version.
    pub fn version(&self) -> &Version {
        &self.formula.version
    }

    /// The asset declared for exactly this platform.
    pub fn asset_for(&self, platform: Platform) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|a| a.platform() == platform)
    }

    /// The fallback declared for this platform.
    pub fn fallback_for(&self, platform: Platform) -> Option<&Fallback> {
        self.fallbacks.iter().find(|f| f.platform() == platform)
    }

    /// Name of the binary the smoke test runs.
    pub fn test_bin(&self) -> &str {
        self.test.bin.as_deref().unwrap_or(self.formula.name.as_str())
    }
}

/// Extract the filename from a URL.
pub fn filename_from_url(url: &str) -> &str {
    url.split('/').next_back().unwrap_or("")
}
