//! Uninstall command

use anyhow::{Context as _, Result};
use tap_core::{InstallError, Reporter};
use tap_schema::FormulaName;

use super::Context;

/// Remove one or more installed formulas.
pub fn uninstall(ctx: &Context, names: &[String]) -> Result<()> {
    let installer = ctx.installer()?;
    ctx.output.section("Removing");

    for name in names {
        let name = FormulaName::new(name);

        if ctx.dry_run {
            let receipt = installer
                .installed(&name)?
                .ok_or_else(|| InstallError::NotInstalled(name.to_string()))?;
            for file in &receipt.files {
                ctx.output
                    .info(&format!("(dry run) Would remove {}", file.display()));
            }
            continue;
        }

        installer
            .uninstall(&name)
            .with_context(|| format!("Failed to uninstall {name}"))?;
    }
    Ok(())
}
