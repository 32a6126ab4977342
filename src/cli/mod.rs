//! CLI layer - Command-line interface
//!
//! Contains argument parsing, output formatting, signal handling,
//! and the capture and watch runners.

pub mod app;
pub mod args;
pub mod config_cmd;
pub mod presenter;
pub mod signals;
pub mod watch;

// Re-export commonly used types
pub use app::{run_capture, run_format, CaptureSettings, OutputOptions, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
pub use args::{Cli, Commands, ConfigAction, KindArg};
pub use presenter::Presenter;
pub use watch::run_watch;
