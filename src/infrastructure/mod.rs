//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with a local Chromium and the XDG config directory.

pub mod browser;
pub mod config;

// Re-export adapters
pub use browser::ChromeLauncher;
pub use config::XdgConfigStore;
