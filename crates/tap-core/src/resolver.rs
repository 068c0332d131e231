//! Platform resolution.
//!
//! Picks the release asset a formula publishes for an (OS, arch) pair.
//! Resolution is a pure table lookup: it never touches the network, so an
//! unsupported platform is rejected before any download is attempted.

use tap_schema::{Formula, FormulaName, Platform, ReleaseAsset, Version};
use thiserror::Error;

/// The formula publishes nothing usable for the requested platform.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{name} {version} has no release for {platform}")]
pub struct UnsupportedPlatform {
    /// Formula name.
    pub name: FormulaName,
    /// Formula version.
    pub version: Version,
    /// Requested platform.
    pub platform: Platform,
}

/// Outcome of a successful lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution<'a> {
    /// Platform that was asked for.
    pub requested: Platform,
    /// Asset to download. Its platform differs from `requested` when a
    /// fallback applied.
    pub asset: &'a ReleaseAsset,
    /// Advisory to show the user; set only for fallbacks.
    pub caveat: Option<&'a str>,
}

impl Resolution<'_> {
    /// Whether the asset was reached through a compatibility fallback.
    pub fn is_fallback(&self) -> bool {
        self.asset.platform() != self.requested
    }
}

/// Resolves the asset for `platform`.
///
/// An exact asset wins; otherwise a declared fallback routes to another
/// architecture's asset and carries its caveat.
///
/// # Errors
///
/// Returns [`UnsupportedPlatform`] when neither exists.
pub fn resolve(formula: &Formula, platform: Platform) -> Result<Resolution<'_>, UnsupportedPlatform> {
    if let Some(asset) = formula.asset_for(platform) {
        tracing::debug!("Resolved {} {} for {platform}", formula.name(), formula.version());
        return Ok(Resolution {
            requested: platform,
            asset,
            caveat: None,
        });
    }

    let routed = formula
        .fallback_for(platform)
        .and_then(|fallback| Some((fallback, formula.asset_for(fallback.target())?)));
    if let Some((fallback, asset)) = routed {
        tracing::debug!(
            "Resolved {} {} for {platform} via {}",
            formula.name(),
            formula.version(),
            fallback.target()
        );
        return Ok(Resolution {
            requested: platform,
            asset,
            caveat: Some(fallback.caveat.trim()),
        });
    }

    Err(UnsupportedPlatform {
        name: formula.name().clone(),
        version: formula.version().clone(),
        platform,
    })
}

/// Availability of a formula across every known platform, for display.
pub fn availability(formula: &Formula) -> Vec<(Platform, Result<Resolution<'_>, UnsupportedPlatform>)> {
    Platform::all()
        .into_iter()
        .map(|p| (p, resolve(formula, p)))
        .collect()
}
