//! Terminal output.
//!
//! Commands print their results to stdout; progress and status lines go
//! through [`Output`], which writes to stderr so results stay pipeable.
//!
//! - [`theme`] - Colors, icons and size formatting
//! - [`progress`] - Download progress bar
//! - [`output`] - The [`tap_core::Reporter`] used by every command

pub mod output;
pub mod progress;
pub mod theme;

pub use output::Output;
pub use theme::Theme;
