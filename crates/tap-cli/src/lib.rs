//! tap - install command-line tools from a formula tap
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! A tap is a directory of versioned formula documents. Each formula lists
//! one release archive per supported platform together with its SHA-256;
//! `tap install` picks the archive for the host, verifies it and copies the
//! binary into `~/.tap/bin`.
//!
//! # Directory Layout
//!
//! ```text
//! ~/.tap/
//! ├── bin/        # Installed binaries
//! ├── receipts/   # What each install wrote
//! └── tmp/        # Download and extraction scratch
//! ```

pub mod cmd;
pub mod ui;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tap_core::{InstallError, UnsupportedPlatform};
use tap_schema::{Arch, Os};

/// Version reported by `--version`, from `git describe` when available.
pub const VERSION: &str = env!("TAP_VERSION");

#[derive(Debug, Parser)]
#[command(name = "tap")]
#[command(author, version = VERSION, about = "tap - install tools from a formula tap")]
pub struct Cli {
    /// Show what would happen without making changes
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Directory holding formula documents
    #[arg(long, global = true, env = "TAP_FORMULA_DIR", default_value = "Formula")]
    pub tap: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

/// Platform override shared by `install` and `resolve`.
#[derive(Debug, Clone, Copy, clap::Args)]
pub struct PlatformArgs {
    /// Operating system to resolve for (default: host)
    #[arg(long)]
    pub os: Option<Os>,
    /// Architecture to resolve for (default: host)
    #[arg(long)]
    pub arch: Option<Arch>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Install a formula
    Install {
        /// Formula name(s), optionally with version: proton or proton@2.0.1
        #[arg(required = true)]
        formulas: Vec<String>,
        /// Reinstall even if the same version is already installed
        #[arg(short, long)]
        force: bool,
        #[command(flatten)]
        platform: PlatformArgs,
    },
    /// Run the post-install test of an installed formula
    Test {
        /// Formula name
        formula: String,
    },
    /// Remove an installed formula
    Uninstall {
        /// Formula name(s)
        #[arg(required = true)]
        formulas: Vec<String>,
    },
    /// Show formula metadata and platform availability
    Info {
        /// Formula name, name@version, or path to a formula file
        formula: String,
    },
    /// Print the archive and checksum a platform would install (no network)
    Resolve {
        /// Formula name, name@version, or path to a formula file
        formula: String,
        #[command(flatten)]
        platform: PlatformArgs,
    },
    /// List installed formulas
    List {
        /// List formulas available in the tap instead
        #[arg(long)]
        available: bool,
    },
    /// Validate a formula file
    Check {
        /// Formula file(s) to check
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Compute SHA256 hash of a file (for formula authoring)
    Hash {
        /// Files to hash
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print the equivalent Homebrew Ruby formula
    Render {
        /// Formula name, name@version, or path to a formula file
        formula: String,
    },
}

/// Process exit code for a failed command.
///
/// Install failures keep their distinct codes even when wrapped in context.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(e) = err.downcast_ref::<InstallError>() {
        return e.exit_code();
    }
    if err.downcast_ref::<UnsupportedPlatform>().is_some() {
        return 2;
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use tap_schema::{FormulaName, Platform, Version};

    fn unsupported() -> UnsupportedPlatform {
        UnsupportedPlatform {
            name: FormulaName::new("proton"),
            version: Version::new("2.1.0"),
            platform: Platform::new(Os::Linux, Arch::Arm64),
        }
    }

    #[test]
    fn exit_codes_survive_context() {
        let err = Err::<(), _>(InstallError::from(unsupported()))
            .context("Failed to install proton")
            .unwrap_err();
        assert_eq!(exit_code(&err), 2);

        let err = anyhow::Error::new(unsupported());
        assert_eq!(exit_code(&err), 2);

        let err = anyhow::Error::new(InstallError::ChecksumMismatch {
            expected: "aa".into(),
            actual: "bb".into(),
        });
        assert_eq!(exit_code(&err), 4);

        assert_eq!(exit_code(&anyhow::anyhow!("boom")), 1);
    }

    #[test]
    fn parses_install_flags() {
        let cli = Cli::try_parse_from([
            "tap", "install", "proton@2.1.0", "--force", "--os", "darwin", "--arch", "aarch64",
        ])
        .unwrap();
        let Commands::Install {
            formulas,
            force,
            platform,
        } = cli.command
        else {
            panic!("expected install");
        };
        assert_eq!(formulas, vec!["proton@2.1.0"]);
        assert!(force);
        assert_eq!(platform.os, Some(Os::Macos));
        assert_eq!(platform.arch, Some(Arch::Arm64));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["tap", "list", "--quiet", "--tap", "/srv/tap"]).unwrap();
        assert!(cli.quiet);
        assert_eq!(cli.tap, PathBuf::from("/srv/tap"));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
