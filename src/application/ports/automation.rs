//! Browser automation port interfaces
//!
//! The automation runtime is an external collaborator: something that can
//! launch a browser, hand out pages, arm paste listeners inside a page and
//! synthesize key events. The capture engine only talks to these traits.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;

use crate::domain::clipboard::{CaptureRequest, ClipboardSnapshot, PasteKey};

/// Automation errors
#[derive(Debug, Clone, Error)]
pub enum AutomationError {
    #[error("No Chromium-based browser found. Install Chrome/Chromium or set browser_path.")]
    BrowserNotFound,

    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Browser has no open page")]
    NoPage,

    #[error("DevTools protocol error: {0}")]
    Protocol(String),

    #[error("DevTools command '{method}' failed ({code}): {message}")]
    Command {
        method: String,
        code: i64,
        message: String,
    },

    #[error("JavaScript exception: {0}")]
    Script(String),

    #[error("Timed out waiting for {what} after {after:?}")]
    Timeout { what: String, after: Duration },

    #[error("Browser disconnected")]
    Disconnected,
}

/// Options for launching the capture browser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Explicit browser binary; auto-detected when None
    pub browser_path: Option<PathBuf>,
    /// Page the browser opens as its only window
    pub start_url: String,
    /// Bound for DevTools discovery and page settle
    pub launch_timeout: Duration,
}

/// Flips to `true` once the browser connection is gone.
pub type DisconnectSignal = watch::Receiver<bool>;

/// Window size passed to the window-bounds control call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBounds {
    pub width: u32,
    pub height: u32,
}

impl WindowBounds {
    /// Zero-size window: no visible footprint
    pub const fn hidden() -> Self {
        Self {
            width: 0,
            height: 0,
        }
    }
}

/// Handle to one armed in-page paste listener
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListenerId(String);

impl ListenerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Port for starting a browser
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// Start a new browser instance.
    ///
    /// # Arguments
    /// * `options` - Binary, start page and launch bound
    ///
    /// # Returns
    /// A live session, or the reason the browser could not be started
    async fn launch(&self, options: &LaunchOptions)
        -> Result<Box<dyn BrowserSession>, AutomationError>;
}

/// A running browser
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Open pages, in the browser's order
    async fn pages(&self) -> Result<Vec<Arc<dyn CapturePage>>, AutomationError>;

    /// Signal that fires when the browser goes away
    fn disconnected(&self) -> DisconnectSignal;

    /// Terminate the browser
    async fn close(&self) -> Result<(), AutomationError>;
}

/// A page the capture engine can paste into
#[async_trait]
pub trait CapturePage: Send + Sync {
    /// Id of the top-level window hosting this page
    async fn window_id(&self) -> Result<i64, AutomationError>;

    /// Resize the window identified by `window_id`
    async fn set_window_bounds(
        &self,
        window_id: i64,
        bounds: WindowBounds,
    ) -> Result<(), AutomationError>;

    /// Wait until the page's navigation has settled
    async fn wait_for_navigation(&self, timeout: Duration) -> Result<(), AutomationError>;

    /// Install a one-shot paste listener extracting `request`.
    ///
    /// Returns only once the listener is attached in the page.
    async fn arm_listener(&self, request: CaptureRequest) -> Result<ListenerId, AutomationError>;

    /// Wait for the armed listener to fire and return what it extracted.
    ///
    /// `Ok(None)` means the clipboard held nothing of the requested kind.
    async fn collect(
        &self,
        listener: &ListenerId,
    ) -> Result<Option<ClipboardSnapshot>, AutomationError>;

    /// Detach the listener if it is still attached. Idempotent.
    async fn disarm(&self, listener: &ListenerId) -> Result<(), AutomationError>;

    /// Press and hold a key
    async fn key_down(&self, key: PasteKey) -> Result<(), AutomationError>;

    /// Press and release a key
    async fn key_press(&self, key: PasteKey) -> Result<(), AutomationError>;

    /// Release a held key
    async fn key_up(&self, key: PasteKey) -> Result<(), AutomationError>;
}

/// Shared launchers launch the same way as the launcher they wrap
#[async_trait]
impl<T: BrowserLauncher + ?Sized> BrowserLauncher for Arc<T> {
    async fn launch(
        &self,
        options: &LaunchOptions,
    ) -> Result<Box<dyn BrowserSession>, AutomationError> {
        self.as_ref().launch(options).await
    }
}
