//! Output formatting utilities.

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Prints a success message.
pub fn success(message: &str) {
    eprintln!("{} {}", "✓".green().bold(), message);
}

/// Prints an error message.
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Prints a warning message.
pub fn warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Prints an info message.
pub fn info(message: &str) {
    eprintln!("{} {}", "ℹ".blue().bold(), message);
}

/// Prints a labelled value.
pub fn field(label: &str, value: &str) {
    println!("{:>14}: {}", label.bold(), value);
}

/// Prints an item as pretty JSON.
pub fn json<T: Serialize>(item: &T) -> crate::CliResult<()> {
    println!("{}", serde_json::to_string_pretty(item)?);
    Ok(())
}
