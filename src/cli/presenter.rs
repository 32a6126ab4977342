//! CLI presenter for output formatting

use std::io::{self, Write};

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::clipboard::{ClipboardFile, ClipboardSnapshot};

/// Printed in place of data when the clipboard has nothing of the kind
pub const UNAVAILABLE: &str = "(unavailable)";

/// Presenter for CLI output formatting
pub struct Presenter {
    spinner: Option<ProgressBar>,
}

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self { spinner: None }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        self.spinner = Some(spinner);
    }

    /// Mark spinner as failed and finish
    pub fn spinner_fail(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✗".red(), message));
        }
    }

    /// Stop spinner without status
    pub fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout (the captured data)
    pub fn output(&self, text: &str) {
        println!("{}", text);
        let _ = io::stdout().flush();
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }

    /// Print one watch poll result under a label
    pub fn watch_line(&self, label: &str, text: &str) {
        println!("{} {}", format!("[{}]", label).dimmed(), text);
        let _ = io::stdout().flush();
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

/// Human-readable rendering of a capture
pub fn render_snapshot(snapshot: &ClipboardSnapshot) -> String {
    match snapshot {
        ClipboardSnapshot::Types(types) if types.is_empty() => "(no types)".to_string(),
        ClipboardSnapshot::Types(types) => types.join("\n"),
        ClipboardSnapshot::Text(text) | ClipboardSnapshot::Html(text) => text.clone(),
        ClipboardSnapshot::File(file) => render_file(file),
    }
}

/// One-line file summary: name, MIME type and size
pub fn render_file(file: &ClipboardFile) -> String {
    let mime = if file.mime_type.is_empty() {
        "unknown type"
    } else {
        file.mime_type.as_str()
    };
    format!("{} ({}, {})", file.name, mime, file.human_readable_size())
}

/// JSON rendering of a capture; `None` renders as `null`.
///
/// Files are described by metadata only.
pub fn render_json(snapshot: Option<&ClipboardSnapshot>) -> String {
    let value = match snapshot {
        None => serde_json::Value::Null,
        Some(ClipboardSnapshot::Types(types)) => serde_json::json!(types),
        Some(ClipboardSnapshot::Text(text)) | Some(ClipboardSnapshot::Html(text)) => {
            serde_json::json!(text)
        }
        Some(ClipboardSnapshot::File(file)) => serde_json::json!({
            "name": file.name,
            "mimeType": file.mime_type,
            "size": file.size_bytes(),
        }),
    };
    value.to_string()
}
