//! List command

use anyhow::{Context as _, Result};
use crossterm::style::Stylize;
use tap_core::Receipt;

use super::Context;
use crate::ui::theme::format_size;

/// List installed formulas, or with `available` the formulas in the tap.
pub fn list(ctx: &Context, available: bool) -> Result<()> {
    if available {
        return list_available(ctx);
    }

    let receipts = installed_receipts(ctx)?;
    if receipts.is_empty() {
        println!();
        println!("  No formulas installed.");
        println!("  Run 'tap install <formula>' to get started.");
        return Ok(());
    }

    println!();
    println!(
        "  {}",
        format!("{:<16}{:<12}{:<10}{}", "NAME", "VERSION", "SIZE", "INSTALLED").dark_grey()
    );

    let mut total_size = 0u64;
    for r in &receipts {
        total_size += r.size_bytes;
        println!(
            "  {:<16}{:<12}{:<10}{}",
            r.name.as_str(),
            r.version.as_str(),
            format_size(r.size_bytes),
            r.installed_at.format("%Y-%m-%d")
        );
    }

    println!();
    println!(
        "  {}",
        format!(
            "{} formula{}, {}",
            receipts.len(),
            if receipts.len() == 1 { "" } else { "s" },
            format_size(total_size)
        )
        .dark_grey()
    );
    Ok(())
}

fn list_available(ctx: &Context) -> Result<()> {
    let formulas = ctx.tap()?.load_all_latest()?;
    for f in &formulas {
        println!(
            "  {:<16}{:<12}{}",
            f.name().as_str(),
            f.version().as_str(),
            f.formula.desc.as_str().dark_grey()
        );
    }
    Ok(())
}

/// Every readable receipt, sorted by name.
fn installed_receipts(ctx: &Context) -> Result<Vec<Receipt>> {
    let dir = ctx.layout.receipts();
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut receipts = Vec::new();
    for entry in std::fs::read_dir(&dir).context("Failed to read receipts")? {
        let path = entry?.path();
        if path.extension().is_none_or(|e| e != "json") {
            continue;
        }
        match Receipt::load(&path) {
            Ok(Some(r)) => receipts.push(r),
            Ok(None) => {}
            Err(e) => tracing::warn!("Skipping unreadable receipt {}: {e}", path.display()),
        }
    }
    receipts.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(receipts)
}
