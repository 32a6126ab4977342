//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod automation;
pub mod config;

// Re-export common types
pub use automation::{
    AutomationError, BrowserLauncher, BrowserSession, CapturePage, DisconnectSignal,
    LaunchOptions, ListenerId, WindowBounds,
};
pub use config::ConfigStore;
