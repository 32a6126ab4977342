//! Domain layer - Core clipboard capture vocabulary
//!
//! Contains value objects, capture results, configuration, and domain errors.
//! This layer has no dependencies on the browser or the filesystem.

pub mod clipboard;
pub mod config;
pub mod error;
pub mod interval;

// Re-export common types
pub use clipboard::{
    CaptureFailure, CaptureOutcome, CaptureRequest, ClipboardFile, ClipboardSnapshot, PasteKey,
    PasteModifier,
};
pub use config::AppConfig;
pub use error::*;
pub use interval::Interval;
