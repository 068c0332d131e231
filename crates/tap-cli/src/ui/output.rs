//! Unified UI output interface.
//!
//! Every line goes to stderr. Download progress redraws a single line in
//! place when stderr is a terminal and is omitted otherwise.

use std::io::{IsTerminal, Write};

use crossterm::style::{Color, Stylize};
use crossterm::terminal::{Clear, ClearType};
use crossterm::{cursor, queue};
use tap_core::Reporter;
use tap_schema::{FormulaName, Version};

use super::progress::format_download_progress;
use super::theme::{Theme, format_size};

/// Terminal reporter used by every command.
#[derive(Debug, Clone)]
pub struct Output {
    theme: Theme,
    quiet: bool,
    interactive: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Output {
    /// Create an output handle. `quiet` keeps only warnings and errors.
    pub fn new(quiet: bool) -> Self {
        Self {
            theme: Theme::default(),
            quiet,
            interactive: std::io::stderr().is_terminal(),
        }
    }

    /// Prints a success message.
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            self.line(self.theme.icons.success, self.theme.colors.success, msg);
        }
    }

    fn line(&self, icon: &str, color: Color, msg: &str) {
        let mut err = std::io::stderr().lock();
        self.clear_progress(&mut err);
        let _ = writeln!(err, "  {} {msg}", icon.with(color));
    }

    fn label(&self, name: &FormulaName, version: &Version) -> String {
        format!(
            "{} {}",
            name.as_str().with(self.theme.colors.formula_name).bold(),
            version.as_str().with(self.theme.colors.version)
        )
    }

    fn clear_progress(&self, out: &mut impl Write) {
        if self.interactive {
            let _ = queue!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine));
        }
    }

    fn status(&self, name: &FormulaName, version: &Version, state: &str) {
        if self.quiet {
            return;
        }
        let mut err = std::io::stderr().lock();
        self.clear_progress(&mut err);
        let _ = writeln!(
            err,
            "  {} {} {}",
            self.theme.icons.active.with(self.theme.colors.active),
            self.label(name, version),
            state.with(self.theme.colors.secondary)
        );
    }
}

impl Reporter for Output {
    fn section(&self, title: &str) {
        if self.quiet {
            return;
        }
        let mut err = std::io::stderr().lock();
        let _ = writeln!(err);
        let _ = writeln!(err, "{} {}", title.bold(), "─".repeat(40).dark_grey());
    }

    fn downloading(&self, name: &FormulaName, version: &Version, current: u64, total: Option<u64>) {
        if self.quiet || !self.interactive {
            return;
        }
        let mut err = std::io::stderr().lock();
        self.clear_progress(&mut err);
        let _ = write!(
            err,
            "  {} {}  {}",
            self.theme.icons.active.with(self.theme.colors.active),
            self.label(name, version),
            format_download_progress(current, total).with(self.theme.colors.secondary)
        );
        let _ = err.flush();
    }

    fn extracting(&self, name: &FormulaName, version: &Version) {
        self.status(name, version, "extracting");
    }

    fn installing(&self, name: &FormulaName, version: &Version) {
        self.status(name, version, "installing");
    }

    fn removing(&self, name: &FormulaName, version: &Version) {
        self.status(name, version, "removing");
    }

    fn done(&self, name: &FormulaName, version: &Version, detail: &str, size: Option<u64>) {
        if self.quiet {
            return;
        }
        let size = size.map(|s| format!("  {}", format_size(s))).unwrap_or_default();
        let mut err = std::io::stderr().lock();
        self.clear_progress(&mut err);
        let _ = writeln!(
            err,
            "  {} {} {}{}",
            self.theme.icons.success.with(self.theme.colors.success),
            self.label(name, version),
            detail,
            size.with(self.theme.colors.secondary)
        );
    }

    fn failed(&self, name: &FormulaName, version: &Version, reason: &str) {
        let mut err = std::io::stderr().lock();
        self.clear_progress(&mut err);
        let _ = writeln!(
            err,
            "  {} {} {}",
            self.theme.icons.error.with(self.theme.colors.error),
            self.label(name, version),
            reason.with(self.theme.colors.error)
        );
    }

    fn info(&self, msg: &str) {
        if !self.quiet {
            self.line(self.theme.icons.info, self.theme.colors.secondary, msg);
        }
    }

    fn warning(&self, msg: &str) {
        self.line(self.theme.icons.warning, self.theme.colors.warning, msg);
    }

    fn error(&self, msg: &str) {
        self.line(self.theme.icons.error, self.theme.colors.error, msg);
    }
}
