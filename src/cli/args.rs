//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::domain::clipboard::CaptureRequest;

/// pastegrab - read the clipboard through a hidden Chromium window
#[derive(Parser, Debug)]
#[command(name = "pastegrab")]
#[command(version)]
#[command(about = "Read the system clipboard by pasting into a hidden, automation-controlled Chromium window")]
#[command(long_about = None)]
pub struct Cli {
    /// Chromium-family browser binary (default: auto-detect)
    #[arg(long, value_name = "PATH", global = true)]
    pub browser: Option<String>,

    /// Give up on a paste event after this long (e.g., 5s); waits forever if unset
    #[arg(long, value_name = "TIME", global = true)]
    pub capture_timeout: Option<String>,

    /// Modifier held for the paste chord (control, meta)
    #[arg(long, value_name = "KEY", global = true)]
    pub modifier: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the format names on the clipboard
    Types {
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the plain-text clipboard slot
    Text {
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the HTML clipboard slot
    Html {
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Describe the first clipboard file, optionally saving its bytes
    File {
        /// Write the file content here
        #[arg(short = 'o', long, value_name = "PATH")]
        output: Option<PathBuf>,
        /// Print JSON metadata
        #[arg(long)]
        json: bool,
    },
    /// Read an arbitrary named format (not supported)
    Format {
        /// Format name, e.g. image/png
        name: String,
    },
    /// Poll the clipboard and print every result until Ctrl+C
    Watch {
        /// What to read on each poll
        #[arg(short = 'k', long, value_enum, default_value_t = KindArg::Text)]
        kind: KindArg,
        /// Time between polls (e.g., 500ms, 2s)
        #[arg(short = 'i', long, value_name = "TIME")]
        interval: Option<String>,
        /// Print one JSON document per poll
        #[arg(long)]
        json: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Capture kind argument for clap ValueEnum
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Types,
    Text,
    Html,
    File,
}

impl From<KindArg> for CaptureRequest {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Types => CaptureRequest::Types,
            KindArg::Text => CaptureRequest::PlainText,
            KindArg::Html => CaptureRequest::RichText,
            KindArg::File => CaptureRequest::File,
        }
    }
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "browser_path",
    "start_url",
    "launch_timeout",
    "capture_timeout",
    "interval",
    "paste_modifier",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
