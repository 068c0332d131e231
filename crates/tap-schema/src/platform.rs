//! Operating system and CPU architecture identifiers.
//!
//! Release assets are keyed by a [`Platform`]. Vendors spell the same
//! platform several ways (`darwin`/`macos`/`osx`, `arm64`/`aarch64`,
//! `x86_64`/`amd64`), so parsing accepts every alias while display always
//! uses one canonical spelling. Formula documents and command-line flags
//! share the same [`FromStr`](std::str::FromStr) parser.

use serde::{Deserialize, Deserializer, Serialize};

/// Operating system a release asset targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    /// Apple macOS (Darwin kernel).
    Macos,
    /// Linux-based operating systems.
    Linux,
}

impl Os {
    /// Get the host operating system, if it is one we publish assets for.
    pub fn current() -> Option<Self> {
        Self::from_rust_name(std::env::consts::OS)
    }

    /// Map a `std::env::consts::OS` value.
    pub fn from_rust_name(name: &str) -> Option<Self> {
        match name {
            "macos" => Some(Self::Macos),
            "linux" => Some(Self::Linux),
            _ => None,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Macos => "macos",
            Self::Linux => "linux",
        }
    }
}

impl std::fmt::Display for Os {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Os {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "macos" | "darwin" | "osx" | "mac" => Ok(Self::Macos),
            "linux" => Ok(Self::Linux),
            _ => Err(format!("Unknown operating system: {s}")),
        }
    }
}

impl<'de> Deserialize<'de> for Os {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

/// CPU architecture a release asset targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// Intel/AMD 64-bit.
    X86_64,
    /// ARM 64-bit (Apple Silicon, Graviton, ...).
    Arm64,
}

impl Arch {
    /// Get the host architecture, if it is one we publish assets for.
    pub fn current() -> Option<Self> {
        Self::from_rust_name(std::env::consts::ARCH)
    }

    /// Map a `std::env::consts::ARCH` value.
    pub fn from_rust_name(name: &str) -> Option<Self> {
        match name {
            "x86_64" => Some(Self::X86_64),
            "aarch64" => Some(Self::Arm64),
            _ => None,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Arm64 => "arm64",
        }
    }

    /// The `Hardware::CPU` predicate Homebrew uses for this architecture.
    pub fn homebrew_predicate(&self) -> &'static str {
        match self {
            Self::X86_64 => "intel?",
            Self::Arm64 => "arm?",
        }
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Arch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "x86_64" | "amd64" | "intel" | "x64" => Ok(Self::X86_64),
            "arm64" | "aarch64" | "arm" => Ok(Self::Arm64),
            _ => Err(format!("Unknown architecture: {s}")),
        }
    }
}

impl<'de> Deserialize<'de> for Arch {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

/// An (OS, architecture) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Platform {
    /// Operating system.
    pub os: Os,
    /// CPU architecture.
    pub arch: Arch,
}

impl Platform {
    /// Build a platform from its parts.
    pub const fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// The host platform, or `None` when running somewhere no asset could target.
    pub fn current() -> Option<Self> {
        Some(Self::new(Os::current()?, Arch::current()?))
    }

    /// Every platform a formula may declare, in display order.
    pub fn all() -> [Self; 4] {
        [
            Self::new(Os::Macos, Arch::X86_64),
            Self::new(Os::Macos, Arch::Arm64),
            Self::new(Os::Linux, Arch::X86_64),
            Self::new(Os::Linux, Arch::Arm64),
        ]
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    /// Parses `os/arch`, `os-arch` or `os_arch`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (os, arch) = s
            .split_once(['/', '-', '_'])
            .ok_or_else(|| format!("Expected <os>/<arch>, got '{s}'"))?;
        Ok(Self::new(os.parse()?, arch.parse()?))
    }
}

/// Platform hints found in an asset file name.
///
/// Either part is `None` when the name carries no recognizable keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilenameHint {
    /// Operating system keyword, if any.
    pub os: Option<Os>,
    /// Architecture keyword, if any.
    pub arch: Option<Arch>,
}

impl FilenameHint {
    /// Infer platform keywords from a file name such as `proton_Darwin_x86_64.tar.gz`.
    pub fn from_filename(filename: &str) -> Self {
        let f = filename.to_lowercase();

        let os = if f.contains("darwin")
            || f.contains("macos")
            || f.contains("osx")
            || f.contains("apple")
        {
            Some(Os::Macos)
        } else if f.contains("linux") {
            Some(Os::Linux)
        } else {
            None
        };

        let arch = if f.contains("arm64") || f.contains("aarch64") {
            Some(Arch::Arm64)
        } else if f.contains("x86_64") || f.contains("amd64") || f.contains("x64") {
            Some(Arch::X86_64)
        } else {
            None
        };

        Self { os, arch }
    }

    /// Whether the hint contradicts `platform`. Missing keywords never conflict.
    pub fn conflicts_with(&self, platform: Platform) -> bool {
        self.os.is_some_and(|os| os != platform.os)
            || self.arch.is_some_and(|arch| arch != platform.arch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases() {
        assert_eq!("Darwin".parse::<Os>().unwrap(), Os::Macos);
        assert_eq!("aarch64".parse::<Arch>().unwrap(), Arch::Arm64);
        assert_eq!("amd64".parse::<Arch>().unwrap(), Arch::X86_64);
        assert!("windows".parse::<Os>().is_err());
    }

    #[test]
    fn documents_accept_every_flag_spelling() {
        #[derive(Debug, Deserialize)]
        struct Row {
            os: Os,
            arch: Arch,
        }

        for (os, arch) in [("mac", "x64"), ("Darwin", "AMD64"), ("osx", "intel")] {
            let row: Row = toml::from_str(&format!("os = \"{os}\"\narch = \"{arch}\"")).unwrap();
            assert_eq!(row.os, os.parse().unwrap());
            assert_eq!(row.arch, arch.parse().unwrap());
            assert_eq!(Platform::new(row.os, row.arch), Platform::new(Os::Macos, Arch::X86_64));
        }

        let bad = toml::from_str::<Row>("os = \"windows\"\narch = \"x64\"").unwrap_err();
        assert!(bad.to_string().contains("Unknown operating system: windows"));
    }

    #[test]
    fn parses_platform_pairs() {
        let p: Platform = "darwin/arm64".parse().unwrap();
        assert_eq!(p, Platform::new(Os::Macos, Arch::Arm64));
        assert_eq!(p.to_string(), "macos/arm64");

        let q: Platform = "linux-amd64".parse().unwrap();
        assert_eq!(q, Platform::new(Os::Linux, Arch::X86_64));

        assert!("linux".parse::<Platform>().is_err());
    }

    #[test]
    fn rust_names_map_to_platforms() {
        assert_eq!(Os::from_rust_name("macos"), Some(Os::Macos));
        assert_eq!(Os::from_rust_name("windows"), None);
        assert_eq!(Arch::from_rust_name("aarch64"), Some(Arch::Arm64));
        assert_eq!(Arch::from_rust_name("riscv64"), None);
    }

    #[test]
    fn filename_hints() {
        let h = FilenameHint::from_filename("proton_Darwin_x86_64.tar.gz");
        assert_eq!(h.os, Some(Os::Macos));
        assert_eq!(h.arch, Some(Arch::X86_64));
        assert!(!h.conflicts_with(Platform::new(Os::Macos, Arch::X86_64)));
        assert!(h.conflicts_with(Platform::new(Os::Linux, Arch::X86_64)));

        let bare = FilenameHint::from_filename("proton.tar.gz");
        assert!(!bare.conflicts_with(Platform::new(Os::Linux, Arch::Arm64)));
    }
}
