//! Info command

use anyhow::Result;
use crossterm::style::Stylize;
use tap_core::{Tap, availability};

use super::Context;
use crate::ui::theme::format_size;

/// Show formula metadata, platform availability and install state.
pub fn info(ctx: &Context, spec: &str) -> Result<()> {
    let formula = ctx.load(spec)?;
    let meta = &formula.formula;
    let lw = 12;

    println!();
    println!(
        "  {} {}",
        meta.name.as_str().white().bold(),
        meta.version.as_str().dark_grey()
    );
    if !meta.desc.is_empty() {
        println!("  {}", meta.desc);
    }
    println!();

    if !meta.homepage.is_empty() {
        println!("  {:<lw$}{}", "homepage", meta.homepage);
    }
    if let Some(license) = &meta.license {
        println!("  {:<lw$}{license}", "license");
    }

    if let Ok(versions) = Tap::open(&ctx.tap_dir).and_then(|tap| tap.versions(&meta.name)) {
        let list: Vec<&str> = versions.iter().map(|v| v.as_str()).collect();
        println!("  {:<lw$}{}", "versions", list.join(", "));
    }

    println!();
    for (platform, resolution) in availability(&formula) {
        let status = match resolution {
            Ok(r) if r.is_fallback() => {
                format!("via {} (compatibility)", r.asset.platform()).yellow()
            }
            Ok(r) => r.asset.filename().to_string().green(),
            Err(_) => "unsupported".to_string().dark_grey(),
        };
        println!("  {:<lw$}{status}", platform.to_string());
    }

    let receipt = tap_core::Receipt::load(&ctx.layout.receipt_path(&meta.name))?;
    if let Some(r) = receipt {
        println!();
        println!(
            "  {:<lw$}{} ({}, {})",
            "installed",
            r.version,
            format_size(r.size_bytes),
            r.installed_at.format("%Y-%m-%d")
        );
    }

    Ok(())
}
