//! Home directory layout.

use dirs::home_dir;
use std::path::{self, PathBuf};

/// Environment variable overriding the tap home directory.
pub const HOME_ENV: &str = "TAP_HOME";

/// Returns the tap home directory, or None if the user's home cannot be resolved.
///
/// `TAP_HOME` wins; otherwise `~/.tap`. A relative `TAP_HOME` is resolved
/// against the current directory.
pub fn try_tap_home() -> Option<PathBuf> {
    std::env::var(HOME_ENV)
        .ok()
        .filter(|val| !val.is_empty())
        .map(|val| make_absolute(PathBuf::from(val)))
        .or_else(|| home_dir().map(|h| h.join(".tap")))
}

fn make_absolute(p: PathBuf) -> PathBuf {
    path::absolute(&p).unwrap_or(p)
}

/// Directory layout under a tap home.
///
/// ```text
/// <home>/
/// ├── bin/        # Installed binaries
/// ├── receipts/   # One JSON receipt per installed formula
/// └── tmp/        # Downloads and extraction scratch (same volume as bin/)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    /// Layout rooted at `root`, made absolute so receipts stay valid from
    /// any working directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: make_absolute(root.into()),
        }
    }

    /// Layout rooted at [`try_tap_home`].
    pub fn from_env() -> Option<Self> {
        try_tap_home().map(Self::new)
    }

    /// Binary installation target: <home>/bin
    pub fn bin(&self) -> PathBuf {
        self.root.join("bin")
    }

    /// Install receipts: <home>/receipts
    pub fn receipts(&self) -> PathBuf {
        self.root.join("receipts")
    }

    /// Temp path: <home>/tmp (guaranteed same volume as bin)
    pub fn tmp(&self) -> PathBuf {
        self.root.join("tmp")
    }

    /// Receipt file for one formula.
    pub fn receipt_path(&self, name: &str) -> PathBuf {
        self.receipts().join(format!("{name}.json"))
    }

    /// Create every directory of the layout.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if a directory cannot be created.
    pub fn ensure(&self) -> std::io::Result<()> {
        for dir in [self.bin(), self.receipts(), self.tmp()] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}
