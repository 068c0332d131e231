//! Install command

use anyhow::{Context as _, Result};
use tap_core::{InstallOptions, InstallOutcome, Reporter};

use super::Context;
use crate::PlatformArgs;

/// Install one or more formulas, in order. The first failure aborts.
pub async fn install(
    ctx: &Context,
    specs: &[String],
    force: bool,
    platform: PlatformArgs,
) -> Result<()> {
    let opts = InstallOptions {
        platform: platform.platform()?,
        force,
        dry_run: ctx.dry_run,
    };
    let installer = ctx.installer()?;

    ctx.output.section("Installing");
    let start = std::time::Instant::now();
    let mut installed = 0usize;

    for spec in specs {
        let formula = ctx.load(spec)?;
        let outcome = installer
            .install(&formula, &opts)
            .await
            .with_context(|| format!("Failed to install {} {}", formula.name(), formula.version()))?;

        if matches!(outcome, InstallOutcome::Installed(_)) {
            installed += 1;
        }
    }

    if installed > 0 {
        ctx.output.success(&format!(
            "{installed} formula{} installed in {:.1}s",
            if installed == 1 { "" } else { "s" },
            start.elapsed().as_secs_f64()
        ));
        warn_if_not_on_path(ctx);
    }
    Ok(())
}

fn warn_if_not_on_path(ctx: &Context) {
    let bin = ctx.layout.bin();
    let on_path = std::env::var_os("PATH")
        .is_some_and(|path| std::env::split_paths(&path).any(|p| p == bin));
    if !on_path {
        ctx.output.info(&format!(
            "{} is not on your PATH; add it to run installed tools directly",
            bin.display()
        ));
    }
}
