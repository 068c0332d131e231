//! Formula lookup in a tap directory.
//!
//! A tap stores one file per published version:
//!
//! ```text
//! Formula/
//! └── proton/
//!     ├── 2.0.1.toml
//!     └── 2.1.0.toml
//! ```
//!
//! Published files are never rewritten; the highest version supersedes the
//! others.

use std::path::{Path, PathBuf};

use tap_schema::{Formula, FormulaError, FormulaName, FormulaSpec, SpecError, Version};
use thiserror::Error;

/// Errors from locating or loading a formula.
#[derive(Error, Debug)]
pub enum TapError {
    /// The tap directory does not exist.
    #[error("Tap directory not found: {0}")]
    Missing(PathBuf),

    /// No formula with this name.
    #[error("Formula '{0}' not found")]
    FormulaNotFound(FormulaName),

    /// The formula exists but not at this version.
    #[error("Formula '{name}' has no version {version}")]
    VersionNotFound {
        /// Formula name.
        name: FormulaName,
        /// Requested version.
        version: Version,
    },

    /// A formula file failed to load.
    #[error("{path}: {source}")]
    Formula {
        /// File that failed.
        path: PathBuf,
        /// Underlying parse or validation error.
        #[source]
        source: FormulaError,
    },

    /// A formula file declares a different identity than its location.
    #[error("{path} declares {declared}, expected {expected}")]
    Mismatch {
        /// File that failed.
        path: PathBuf,
        /// `name@version` from the document.
        declared: String,
        /// `name@version` implied by the path.
        expected: String,
    },

    /// The specifier is malformed.
    #[error(transparent)]
    Spec(#[from] SpecError),

    /// Directory listing failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A directory of formula documents.
#[derive(Debug, Clone)]
pub struct Tap {
    root: PathBuf,
}

impl Tap {
    /// Open an existing tap directory.
    ///
    /// # Errors
    ///
    /// Returns [`TapError::Missing`] if `root` is not a directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, TapError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(TapError::Missing(root));
        }
        Ok(Self { root })
    }

    /// Names of every formula in the tap, sorted.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be listed.
    pub fn formula_names(&self) -> Result<Vec<FormulaName>, TapError> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(FormulaName::new(name));
            }
        }
        names.sort();
        Ok(names)
    }

    /// Published versions of `name`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`TapError::FormulaNotFound`] if the formula has no directory
    /// or no version files.
    pub fn versions(&self, name: &FormulaName) -> Result<Vec<Version>, TapError> {
        let dir = self.root.join(name.as_str());
        if !dir.is_dir() {
            return Err(TapError::FormulaNotFound(name.clone()));
        }

        let mut versions = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .filter(|_| path.extension().is_some_and(|e| e == "toml"));
            if let Some(stem) = stem {
                versions.push(Version::new(stem));
            }
        }

        if versions.is_empty() {
            return Err(TapError::FormulaNotFound(name.clone()));
        }
        versions.sort();
        Ok(versions)
    }

    /// Newest published version of `name`.
    ///
    /// # Errors
    ///
    /// See [`Tap::versions`].
    pub fn latest(&self, name: &FormulaName) -> Result<Version, TapError> {
        self.versions(name)?
            .pop()
            .ok_or_else(|| TapError::FormulaNotFound(name.clone()))
    }

    /// Load the formula a specifier points at (newest version when unpinned).
    ///
    /// # Errors
    ///
    /// Returns a not-found error, or [`TapError::Formula`] if the file does
    /// not parse or validate, or [`TapError::Mismatch`] if the document's
    /// name or version disagrees with its path.
    pub fn load(&self, spec: &FormulaSpec) -> Result<Formula, TapError> {
        let version = match &spec.version {
            Some(v) => {
                if !self.versions(&spec.name)?.contains(v) {
                    return Err(TapError::VersionNotFound {
                        name: spec.name.clone(),
                        version: v.clone(),
                    });
                }
                v.clone()
            }
            None => self.latest(&spec.name)?,
        };

        let path = self
            .root
            .join(spec.name.as_str())
            .join(format!("{version}.toml"));
        tracing::debug!("Loading formula from {}", path.display());
        let formula = load_file(&path)?;

        if formula.name() != &spec.name || formula.version() != &version {
            return Err(TapError::Mismatch {
                path,
                declared: format!("{}@{}", formula.name(), formula.version()),
                expected: format!("{}@{version}", spec.name),
            });
        }
        Ok(formula)
    }

    /// Every formula at its newest version.
    ///
    /// # Errors
    ///
    /// Fails on the first formula that cannot be loaded.
    pub fn load_all_latest(&self) -> Result<Vec<Formula>, TapError> {
        self.formula_names()?
            .into_iter()
            .map(|name| {
                self.load(&FormulaSpec {
                    name,
                    version: None,
                })
            })
            .collect()
    }
}

/// Load a formula straight from a file path.
///
/// # Errors
///
/// Returns [`TapError::Formula`] if the file cannot be read, parsed or validated.
pub fn load_file(path: &Path) -> Result<Formula, TapError> {
    Formula::from_file(path).map_err(|source| TapError::Formula {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a formula from a specifier that may instead be a path to a `.toml` file.
///
/// # Errors
///
/// See [`Tap::load`] and [`load_file`].
pub fn load_spec_or_file(tap: Option<&Tap>, spec: &str) -> Result<Formula, TapError> {
    let as_path = Path::new(spec);
    if as_path.extension().is_some_and(|e| e == "toml") && as_path.is_file() {
        return load_file(as_path);
    }

    let parsed = FormulaSpec::parse(spec)?;
    match tap {
        Some(tap) => tap.load(&parsed),
        None => Err(TapError::FormulaNotFound(parsed.name)),
    }
}
