//! Terminal presentation for search results.
//!
//! This module provides colored status output, the results grid, the detail
//! overlay and a loading spinner.

mod grid;
mod overlay;

pub use grid::{render_plain, results_summary, results_table};
pub use overlay::DetailOverlay;

use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::time::Duration;

use crate::validate::FieldErrors;

/// Default width when terminal size cannot be determined.
pub const DEFAULT_WIDTH: usize = 100;

/// Get the current terminal width.
pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(DEFAULT_WIDTH)
}

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
    Search,
}

/// Status icons for different operations.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
        Status::Search => "🔍",
    }
}

/// Print a styled status message.
pub fn print_status(status: Status, msg: &str) {
    let icon = status_icon(status);
    match status {
        Status::Success => println!("{} {}", icon.green().bold(), msg),
        Status::Error => eprintln!("{} {}", icon.red().bold(), msg),
        Status::Warning => eprintln!("{} {}", icon.yellow().bold(), msg),
        Status::Info => println!("{} {}", icon.cyan().bold(), msg),
        Status::Search => println!("{} {}", icon.yellow(), msg),
    }
}

/// Print a section header.
pub fn print_section(title: &str) {
    println!();
    println!("{}", format!("━━━ {} ━━━", title).bold().cyan());
}

/// Print validation messages, one per field.
pub fn print_field_errors(errors: &FieldErrors) {
    for (field, error) in errors.iter() {
        eprintln!(
            "{} {}: {}",
            status_icon(Status::Error).red().bold(),
            field.name().yellow(),
            error
        );
    }
}

/// Format a number with commas.
pub fn format_number(n: usize) -> String {
    n.to_string()
        .chars()
        .rev()
        .collect::<Vec<_>>()
        .chunks(3)
        .map(|c| c.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(",")
        .chars()
        .rev()
        .collect()
}

/// Truncate text to fit within the specified width using unicode-aware truncation.
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if max_width <= 3 {
        return "...".to_string();
    }

    let char_widths: Vec<(char, usize)> = text
        .chars()
        .map(|c| (c, unicode_width::UnicodeWidthChar::width(c).unwrap_or(1)))
        .collect();

    let total_width: usize = char_widths.iter().map(|(_, w)| *w).sum();
    if total_width <= max_width {
        return text.to_string();
    }

    let mut current_width = 0;
    let mut end_idx = 0;
    for (i, (_, w)) in char_widths.iter().enumerate() {
        if current_width + w > max_width - 3 {
            break;
        }
        current_width += w;
        end_idx = i + 1;
    }

    let truncated: String = char_widths[..end_idx].iter().map(|(c, _)| *c).collect();
    format!("{}...", truncated)
}

/// Loading indicator shown while a page is being fetched.
pub struct Spinner {
    pb: indicatif::ProgressBar,
}

impl Spinner {
    /// Create a new spinner with the given message.
    pub fn new(msg: &str) -> Self {
        let pb = indicatif::ProgressBar::new_spinner();
        pb.set_style(
            indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner())
                .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    /// A spinner that draws nothing, for quiet or non-terminal output.
    pub fn hidden() -> Self {
        Self {
            pb: indicatif::ProgressBar::hidden(),
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.pb.is_hidden()
    }

    /// Finish with success message.
    pub fn finish_with_success(&self, msg: &str) {
        self.finish_styled("{spinner:.green} {msg}", Status::Success, msg);
    }

    /// Finish with error message.
    pub fn finish_with_error(&self, msg: &str) {
        self.finish_styled("{spinner:.red} {msg}", Status::Error, msg);
    }

    /// Remove the spinner from the terminal.
    pub fn clear(&self) {
        self.pb.finish_and_clear();
    }

    fn finish_styled(&self, template: &str, status: Status, msg: &str) {
        let icon = status_icon(status);
        if let Ok(style) = indicatif::ProgressStyle::with_template(template) {
            // the last tick char is what a finished spinner shows
            self.pb.set_style(style.tick_strings(&[icon, icon]));
        }
        self.pb.finish_with_message(msg.to_string());
    }
}
