//! Output functions for consistent message formatting.
//!
//! The land pipeline narrates its decisions as labeled phase lines, e.g.
//!
//! ```text
//!   ONTO TARGET  Landing onto target "master", the default target under git.
//!   MERGING      f3a91c2 Add rate limiting to the sync endpoint
//! ```
//!
//! Recovery and manual-publish commands are printed as literal copy-pasteable
//! lines, indented under a `$` marker.

use colored::Colorize;

use super::style::*;

/// Width reserved for phase labels so messages line up
const LABEL_WIDTH: usize = 13;

/// Print a phase status line: "  LABEL  message"
pub fn status(label: &str, message: &str) {
    println!("  {:<width$} {}", label_style(label), message, width = LABEL_WIDTH);
}

/// Print a labeled warning line
pub fn warning(label: &str, message: &str) {
    println!(
        "{} {:<width$} {}",
        MARK_WARNING.yellow().bold(),
        warning_label_style(label),
        message,
        width = LABEL_WIDTH
    );
}

/// Print error message to stderr: "✗ {message}" in red
pub fn error_stderr(message: &str) {
    eprintln!("{} {}", MARK_ERROR.red(), message);
}

/// Print success message: "✓ {message}" in green
pub fn success(message: &str) {
    println!("{} {}", MARK_SUCCESS.green(), message);
}

/// Print indented item: "  • {message}"
pub fn bullet(message: &str) {
    println!("  {} {}", MARK_BULLET, message);
}

/// Print a copy-pasteable command line, indented under a `$` marker
pub fn command(cmd: &str) {
    println!();
    println!("    {} {}", "$".bold(), cmd_style(cmd));
    println!();
}

/// Format a branch name in the standard style
pub fn branch(name: &str) -> String {
    format!("{}", branch_style(name))
}

/// Format a commit hash in the standard style
pub fn hash(h: &str) -> String {
    format!("{}", hash_style(h))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_helpers() {
        assert!(!branch("feature").is_empty());
        assert!(!hash("f3a91c2").is_empty());
    }

    #[test]
    fn test_output_functions_dont_panic() {
        status("MERGING", "test message");
        warning("LOCAL CYCLE", "test warning");
        success("test success");
        bullet("test bullet");
        command("git push -- origin abc123:master");
    }
}
