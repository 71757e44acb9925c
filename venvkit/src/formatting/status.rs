//! Status indicators and message formatting.

use owo_colors::OwoColorize;
use venvkit_core::Error as CoreError;

/// Status types for consistent formatting.
#[derive(Debug, Clone, Copy)]
pub enum Status {
    Success,
    Error,
    Warning,
}

impl Status {
    pub fn symbol(&self) -> &'static str {
        match self {
            Status::Success => "✓",
            Status::Error => "✗",
            Status::Warning => "⚠",
        }
    }

    pub fn colored_symbol(&self) -> String {
        match self {
            Status::Success => self.symbol().green().to_string(),
            Status::Error => self.symbol().red().to_string(),
            Status::Warning => self.symbol().yellow().to_string(),
        }
    }

    /// Formats a status message with symbol and color.
    pub fn format(&self, message: &str) -> String {
        format!("{} {}", self.colored_symbol(), self.colorize_text(message))
    }

    fn colorize_text(&self, text: &str) -> String {
        match self {
            Status::Success => text.green().bold().to_string(),
            Status::Error => text.red().bold().to_string(),
            Status::Warning => text.yellow().bold().to_string(),
        }
    }
}

pub fn print_success(message: &str) {
    eprintln!("{}", Status::Success.format(message));
}

pub fn print_warning(message: &str) {
    eprintln!("{}", Status::Warning.format(message));
}

/// Prints the single diagnostic line for a failed invocation, naming the
/// stage that failed.
pub fn print_failure(error: &anyhow::Error) {
    let stage = error
        .downcast_ref::<CoreError>()
        .map(|e| e.stage().to_string())
        .unwrap_or_else(|| "startup".to_string());
    eprintln!(
        "{}",
        Status::Error.format(&format!("venvkit: {} failed: {:#}", stage, error))
    );
}
