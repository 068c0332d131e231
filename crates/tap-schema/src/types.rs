//! Newtypes for formula names, versions and install specifiers.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use thiserror::Error;

/// A normalized formula name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct FormulaName(String);

impl FormulaName {
    /// Create a new formula name, normalizing the input to lowercase.
    pub fn new(name: &str) -> Self {
        Self(name.to_lowercase())
    }

    /// Return the normalized name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Ruby class name Homebrew derives from the formula name
    /// (`proton` -> `Proton`, `foo-bar` -> `FooBar`).
    pub fn class_name(&self) -> String {
        self.0
            .split(['-', '_'])
            .filter(|part| !part.is_empty())
            .map(|part| {
                let mut chars = part.chars();
                chars.next().map_or_else(String::new, |first| {
                    first.to_uppercase().chain(chars).collect()
                })
            })
            .collect()
    }
}

impl std::fmt::Display for FormulaName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Deref for FormulaName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for FormulaName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<std::path::Path> for FormulaName {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}

impl PartialEq<str> for FormulaName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.to_lowercase()
    }
}

impl PartialEq<&str> for FormulaName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.to_lowercase()
    }
}

impl Borrow<str> for FormulaName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FormulaName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for FormulaName {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

/// A formula version string.
///
/// Ordering follows semver when both sides parse; otherwise a parseable
/// version sorts before an unparseable one and two unparseable versions
/// compare lexically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct Version(String);

impl Ord for Version {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match (
            semver::Version::parse(&self.0),
            semver::Version::parse(&other.0),
        ) {
            (Ok(a), Ok(b)) => a.cmp(&b),
            (Ok(_), Err(_)) => std::cmp::Ordering::Less,
            (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
            (Err(_), Err(_)) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Version {
    /// Create a new version from the given string (a leading `v` is dropped).
    pub fn new(v: &str) -> Self {
        Self(v.strip_prefix('v').unwrap_or(v).to_string())
    }

    /// Return the version string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Deref for Version {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for Version {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Version {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Version {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl PartialEq<&str> for Version {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Errors from parsing a `name[@version]` specifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecError {
    /// Nothing before the `@`.
    #[error("Invalid formula specifier: missing formula name")]
    MissingName,
    /// Nothing after the `@`.
    #[error("Invalid formula specifier: missing version after @")]
    MissingVersion,
}

/// A formula specifier such as `proton` or `proton@2.0.1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaSpec {
    /// Requested formula.
    pub name: FormulaName,
    /// Pinned version; `None` means the newest published version.
    pub version: Option<Version>,
}

impl FormulaSpec {
    /// Parse a formula specifier like `proton` or `proton@2.0.1`.
    ///
    /// `@latest` is treated the same as no version.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError`] when either side of the `@` is empty.
    pub fn parse(spec: &str) -> Result<Self, SpecError> {
        match spec.split_once('@') {
            Some((name, version)) => {
                if name.is_empty() {
                    return Err(SpecError::MissingName);
                }
                if version.is_empty() {
                    return Err(SpecError::MissingVersion);
                }
                let version = (version != "latest").then(|| Version::new(version));
                Ok(Self {
                    name: FormulaName::new(name),
                    version,
                })
            }
            None if spec.is_empty() => Err(SpecError::MissingName),
            None => Ok(Self {
                name: FormulaName::new(spec),
                version: None,
            }),
        }
    }
}

impl std::fmt::Display for FormulaSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}@{v}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}
