//! Capture request value object

use std::fmt;
use std::str::FromStr;

use crate::domain::error::InvalidCaptureKindError;

/// Which projection of the paste event a capture extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureRequest {
    /// Advertised format names (`clipboardData.types`)
    Types,
    /// The `text/plain` slot
    PlainText,
    /// The `text/html` slot
    RichText,
    /// The first attached file
    File,
}

impl CaptureRequest {
    /// All supported requests
    pub const fn all() -> &'static [CaptureRequest] {
        &[Self::Types, Self::PlainText, Self::RichText, Self::File]
    }

    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Types => "types",
            Self::PlainText => "text",
            Self::RichText => "html",
            Self::File => "file",
        }
    }

    /// The clipboard slot read with `getData`, for the string projections.
    pub const fn data_slot(&self) -> Option<&'static str> {
        match self {
            Self::PlainText => Some("text/plain"),
            Self::RichText => Some("text/html"),
            Self::Types | Self::File => None,
        }
    }
}

impl fmt::Display for CaptureRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CaptureRequest {
    type Err = InvalidCaptureKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "types" => Ok(Self::Types),
            "text" | "plain" | "text/plain" => Ok(Self::PlainText),
            "html" | "rich" | "text/html" => Ok(Self::RichText),
            "file" | "files" => Ok(Self::File),
            _ => Err(InvalidCaptureKindError {
                input: s.to_string(),
            }),
        }
    }
}
