//! Resolve command

use anyhow::Result;
use tap_core::{Reporter, resolve as resolve_asset};

use super::Context;
use crate::PlatformArgs;

/// Print the asset a platform would install, without touching the network.
pub fn resolve(ctx: &Context, spec: &str, platform: PlatformArgs) -> Result<()> {
    let platform = platform.platform()?;
    let formula = ctx.load(spec)?;
    let resolution = resolve_asset(&formula, platform)?;
    let asset = resolution.asset;

    let lw = 10;
    println!("{:<lw$}{} {}", "formula", formula.name(), formula.version());
    println!("{:<lw$}{platform}", "platform");
    if resolution.is_fallback() {
        println!("{:<lw$}{} (fallback)", "asset", asset.platform());
    }
    println!("{:<lw$}{}", "url", asset.url);
    println!("{:<lw$}{}", "sha256", asset.sha256);
    for rule in asset.effective_install(formula.name()) {
        println!("{:<lw$}{} -> bin/{}", "install", rule.from, rule.destination());
    }

    if let Some(caveat) = resolution.caveat {
        ctx.output.warning(caveat);
    }
    Ok(())
}
