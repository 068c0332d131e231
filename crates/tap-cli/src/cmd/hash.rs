//! Hash command

use std::path::PathBuf;

use anyhow::{Context, Result};
use tap_core::io::download::sha256_file;

/// Print the SHA256 of each file, `sha256sum` style.
pub fn hash(files: &[PathBuf]) -> Result<()> {
    for path in files {
        let digest =
            sha256_file(path).with_context(|| format!("Failed to read {}", path.display()))?;
        println!("{digest}  {}", path.display());
    }
    Ok(())
}
