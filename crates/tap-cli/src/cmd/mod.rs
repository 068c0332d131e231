//! Command implementations, one module per verb.

pub mod check;
pub mod hash;
pub mod info;
pub mod install;
pub mod list;
pub mod render;
pub mod resolve;
pub mod test;
pub mod uninstall;

use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};
use tap_core::{Installer, Layout, Tap, tap};
use tap_schema::{Arch, Formula, Os, Platform};

use crate::ui::Output;
use crate::{Cli, PlatformArgs};

/// State shared by every command: where formulas come from, where they
/// install to, and how progress is shown.
#[derive(Debug, Clone)]
pub struct Context {
    pub tap_dir: PathBuf,
    pub layout: Layout,
    pub output: Output,
    pub dry_run: bool,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let layout = Layout::from_env()
            .context("Could not determine home directory; set TAP_HOME")?;
        Ok(Self {
            tap_dir: cli.tap.clone(),
            layout,
            output: Output::new(cli.quiet),
            dry_run: cli.dry_run,
        })
    }

    /// The formula tap, which must exist.
    pub fn tap(&self) -> Result<Tap> {
        Tap::open(&self.tap_dir).with_context(|| {
            format!(
                "No formula tap at {} (use --tap or TAP_FORMULA_DIR)",
                self.tap_dir.display()
            )
        })
    }

    /// Load `spec`: `name`, `name@version`, or a path to a formula file.
    pub fn load(&self, spec: &str) -> Result<Formula> {
        let tap = Tap::open(&self.tap_dir).ok();
        if tap.is_none() && !spec.ends_with(".toml") {
            self.tap()?;
        }
        tap::load_spec_or_file(tap.as_ref(), spec)
            .with_context(|| format!("Failed to load formula '{spec}'"))
    }

    pub fn installer(&self) -> Result<Installer<Output>> {
        Installer::new(self.layout.clone(), self.output.clone())
            .context("Failed to initialise HTTP client")
    }
}

impl PlatformArgs {
    /// Requested platform, with missing parts taken from the host.
    pub fn platform(self) -> Result<Platform> {
        match (self.os.or_else(Os::current), self.arch.or_else(Arch::current)) {
            (Some(os), Some(arch)) => Ok(Platform::new(os, arch)),
            _ => bail!(
                "Host platform {}/{} is not supported; pass --os and --arch",
                std::env::consts::OS,
                std::env::consts::ARCH
            ),
        }
    }
}
