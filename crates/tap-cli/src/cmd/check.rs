//! Check command

use std::path::Path;

use anyhow::{Result, bail};
use tap_core::{Reporter, tap};
use tap_schema::{FilenameHint, Formula};

use super::Context;

/// Validate formula files, warning about suspicious but legal content.
pub fn check(ctx: &Context, paths: &[std::path::PathBuf]) -> Result<()> {
    let mut failed = 0usize;

    for path in paths {
        match tap::load_file(path) {
            Ok(formula) => {
                for warning in lint(path, &formula) {
                    ctx.output.warning(&format!("{}: {warning}", path.display()));
                }
                ctx.output.success(&format!(
                    "{} {} is valid ({} asset{}, {} fallback{})",
                    formula.name(),
                    formula.version(),
                    formula.assets.len(),
                    plural(formula.assets.len()),
                    formula.fallbacks.len(),
                    plural(formula.fallbacks.len()),
                ));
            }
            Err(e) => {
                ctx.output.error(&format!("{e}"));
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} formula file(s) failed validation", paths.len());
    }
    Ok(())
}

/// Non-fatal findings: asset file names that name another platform, and a
/// file name that disagrees with the declared version.
pub fn lint(path: &Path, formula: &Formula) -> Vec<String> {
    let mut warnings = Vec::new();

    for asset in &formula.assets {
        let hint = FilenameHint::from_filename(asset.filename());
        if hint.conflicts_with(asset.platform()) {
            warnings.push(format!(
                "asset for {} downloads '{}', which looks like {}/{}",
                asset.platform(),
                asset.filename(),
                hint.os.map_or("?", |os| os.as_str()),
                hint.arch.map_or("?", |arch| arch.as_str()),
            ));
        }
    }

    if formula.assets.is_empty() {
        warnings.push("formula has no assets and installs nowhere".to_string());
    }

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    let looks_versioned = stem.starts_with(|c: char| c.is_ascii_digit());
    if looks_versioned && stem != formula.version().as_str() {
        warnings.push(format!(
            "file name says {stem} but the formula declares {}",
            formula.version()
        ));
    }

    warnings
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}
