//! Download progress formatting.

use super::theme::format_size;

/// Width of the progress bar in cells.
pub const BAR_WIDTH: usize = 24;

/// Format download progress. Without a content length only the byte count
/// is shown.
pub fn format_download_progress(current: u64, total: Option<u64>) -> String {
    match total {
        Some(total) if total > 0 => {
            let pct = (current * 100 / total).min(100);
            let bar = format_progress_bar(current, total, BAR_WIDTH);
            format!("{bar}  {pct:>3}%  {}", format_size(total))
        }
        _ => format_size(current),
    }
}

/// Format a progress bar using ▓ (filled) and ░ (empty).
#[allow(clippy::cast_sign_loss)]
pub fn format_progress_bar(current: u64, total: u64, width: usize) -> String {
    let filled = if total > 0 {
        ((current as f64 / total as f64) * width as f64)
            .round()
            .clamp(0.0, width as f64) as usize
    } else {
        0
    };
    let empty = width.saturating_sub(filled);
    format!("{}{}", "▓".repeat(filled), "░".repeat(empty))
}
