//! Resolution, download verification and installation of tap formulas.

pub mod error;
pub mod install;
pub mod io;
pub mod paths;
pub mod receipt;
pub mod reporter;
pub mod resolver;
pub mod smoke;
pub mod tap;

pub use error::InstallError;
pub use install::{InstallOptions, InstallOutcome, Installer};
pub use paths::*;
pub use receipt::Receipt;
pub use reporter::{NullReporter, RecordingReporter, Reporter};
pub use resolver::{Resolution, UnsupportedPlatform, availability, resolve};
pub use tap::{Tap, TapError};

/// User Agent string for release downloads
pub const USER_AGENT: &str = concat!("tap/", env!("CARGO_PKG_VERSION"));
