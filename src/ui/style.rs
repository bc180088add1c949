//! Style constants and color helpers.
//!
//! Centralizes all styling decisions for consistent output.

use colored::{ColoredString, Colorize};

/// Success marker: ✓
pub const MARK_SUCCESS: &str = "✓";
/// Error/failure marker: ✗
pub const MARK_ERROR: &str = "✗";
/// Warning marker: !
pub const MARK_WARNING: &str = "!";
/// Bullet marker: •
pub const MARK_BULLET: &str = "•";

/// Format a phase label (cyan, bold)
pub fn label_style<S: AsRef<str>>(s: S) -> ColoredString {
    s.as_ref().cyan().bold()
}

/// Format a warning label (yellow, bold)
pub fn warning_label_style<S: AsRef<str>>(s: S) -> ColoredString {
    s.as_ref().yellow().bold()
}

/// Format a branch name (green)
pub fn branch_style<S: AsRef<str>>(s: S) -> ColoredString {
    s.as_ref().green()
}

/// Format command text (cyan)
pub fn cmd_style<S: AsRef<str>>(s: S) -> ColoredString {
    s.as_ref().cyan()
}

/// Format a commit hash (yellow)
pub fn hash_style<S: AsRef<str>>(s: S) -> ColoredString {
    s.as_ref().yellow()
}
