//! Test command

use anyhow::{Context as _, Result};
use tap_core::{InstallError, Reporter};
use tap_schema::FormulaName;

use super::Context;

/// Run the post-install test of the installed version of `name`.
pub async fn test(ctx: &Context, name: &str) -> Result<()> {
    let installer = ctx.installer()?;
    let name = FormulaName::new(name);
    let receipt = installer
        .installed(&name)?
        .ok_or_else(|| InstallError::NotInstalled(name.to_string()))?;

    // The receipt's version decides which test block runs; fall back to
    // the newest formula when that version has been removed from the tap.
    let formula = ctx
        .load(&format!("{name}@{}", receipt.version))
        .or_else(|e| {
            tracing::debug!("{e:#}");
            ctx.output.warning(&format!(
                "{name} {} is no longer in the tap; using the latest test",
                receipt.version
            ));
            ctx.load(name.as_str())
        })?;

    if ctx.dry_run {
        ctx.output.info(&format!(
            "(dry run) Would run {} {}",
            ctx.layout.bin().join(formula.test_bin()).display(),
            formula.test.args.join(" ")
        ));
        return Ok(());
    }

    installer
        .test(&formula)
        .await
        .with_context(|| format!("Test of {name} {} failed", receipt.version))
}
