//! Clipboard capture domain types

mod keys;
mod outcome;
mod request;
mod snapshot;

pub use keys::{PasteKey, PasteModifier};
pub use outcome::{CaptureFailure, CaptureOutcome};
pub use request::CaptureRequest;
pub use snapshot::{ClipboardFile, ClipboardSnapshot};
