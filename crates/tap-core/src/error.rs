//! Domain-specific errors for install operations

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

use crate::io::download::DownloadError;
use crate::io::extract::ExtractError;
use crate::resolver::UnsupportedPlatform;
use crate::tap::TapError;

/// Terminal failure of an install, test or uninstall. Nothing is retried.
#[derive(Error, Debug)]
pub enum InstallError {
    /// No asset (and no fallback) for the requested platform.
    #[error(transparent)]
    UnsupportedPlatform(#[from] UnsupportedPlatform),

    /// Network or HTTP failure while fetching the archive.
    #[error("Download failed: {0}")]
    DownloadFailure(#[source] reqwest::Error),

    /// Downloaded content does not hash to the recorded digest.
    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Digest recorded in the formula.
        expected: String,
        /// Digest of the downloaded bytes.
        actual: String,
    },

    /// The post-install smoke test did not exit successfully.
    #[error("Test failed: {bin} exited with {status}")]
    TestFailure {
        /// Binary that was run.
        bin: PathBuf,
        /// Its exit status.
        status: ExitStatus,
    },

    /// The archive could not be unpacked.
    #[error("Extraction failed: {0}")]
    Extract(#[from] ExtractError),

    /// An install rule names a file the archive does not contain.
    #[error("Archive has no file '{0}'")]
    MissingBinary(String),

    /// The formula is not installed.
    #[error("{0} is not installed")]
    NotInstalled(String),

    /// The formula could not be located or loaded.
    #[error(transparent)]
    Tap(#[from] TapError),

    /// Local filesystem failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<DownloadError> for InstallError {
    fn from(err: DownloadError) -> Self {
        match err {
            DownloadError::Http(e) => Self::DownloadFailure(e),
            DownloadError::Io(e) => Self::Io(e),
            DownloadError::HashMismatch { expected, actual } => {
                Self::ChecksumMismatch { expected, actual }
            }
        }
    }
}

impl InstallError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::UnsupportedPlatform(_) => 2,
            Self::DownloadFailure(_) => 3,
            Self::ChecksumMismatch { .. } => 4,
            Self::TestFailure { .. } => 5,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tap_schema::{Arch, FormulaName, Os, Platform, Version};

    #[test]
    fn hash_mismatch_becomes_checksum_mismatch() {
        let err: InstallError = DownloadError::HashMismatch {
            expected: "aa".to_string(),
            actual: "bb".to_string(),
        }
        .into();
        assert!(matches!(err, InstallError::ChecksumMismatch { .. }));
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn unsupported_platform_exit_code() {
        let err = InstallError::from(UnsupportedPlatform {
            name: FormulaName::new("proton"),
            version: Version::new("2.1.0"),
            platform: Platform::new(Os::Linux, Arch::Arm64),
        });
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.to_string(), "proton 2.1.0 has no release for linux/arm64");
    }
}
