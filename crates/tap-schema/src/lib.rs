//! Shared types and formula documents for the proton tap.

pub mod formula;
pub mod hash;
pub mod platform;
pub mod types;

// Re-exports
pub use formula::{
    Fallback, Formula, FormulaError, FormulaInfo, InstallRule, ReleaseAsset, TestSpec,
    filename_from_url,
};
pub use hash::{DigestError, Sha256Digest};
pub use platform::{Arch, FilenameHint, Os, Platform};
pub use types::{FormulaName, FormulaSpec, SpecError, Version};
