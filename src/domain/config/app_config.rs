//! Application configuration value object

use serde::{Deserialize, Serialize};

use crate::domain::clipboard::PasteModifier;
use crate::domain::interval::Interval;

/// Blank editable page used as the capture surface.
pub const DEFAULT_START_URL: &str =
    "data:text/html,%3Ctitle%3Epastegrab%3C%2Ftitle%3E%3Cbody%20contenteditable%3E%3C%2Fbody%3E";

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub browser_path: Option<String>,
    pub start_url: Option<String>,
    pub launch_timeout: Option<String>,
    pub capture_timeout: Option<String>,
    pub interval: Option<String>,
    pub paste_modifier: Option<String>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            browser_path: None,
            start_url: Some(DEFAULT_START_URL.to_string()),
            launch_timeout: Some(Interval::default_launch_timeout().to_string()),
            capture_timeout: None,
            interval: Some(Interval::default_poll().to_string()),
            paste_modifier: Some(PasteModifier::platform_default().to_string()),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            browser_path: other.browser_path.or(self.browser_path),
            start_url: other.start_url.or(self.start_url),
            launch_timeout: other.launch_timeout.or(self.launch_timeout),
            capture_timeout: other.capture_timeout.or(self.capture_timeout),
            interval: other.interval.or(self.interval),
            paste_modifier: other.paste_modifier.or(self.paste_modifier),
        }
    }

    /// Get start URL, or the built-in blank page if not set
    pub fn start_url_or_default(&self) -> &str {
        self.start_url.as_deref().unwrap_or(DEFAULT_START_URL)
    }
}
