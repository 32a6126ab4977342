//! Application layer - Use cases and port interfaces
//!
//! Contains the session lifecycle and clipboard capture operations,
//! plus the trait definitions for the browser and config store.

pub mod capture;
pub mod ports;
pub mod session;

#[cfg(test)]
pub(crate) mod fakes;

// Re-export use cases
pub use capture::{CaptureEngine, CaptureError};
pub use session::{SessionError, SessionManager};
