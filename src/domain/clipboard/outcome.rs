//! Capture outcome

use std::fmt;
use std::time::Duration;

/// Why a capture produced no data even though the clipboard may hold some.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureFailure {
    /// The paste chord could not be delivered to the page
    Injection(String),
    /// The in-page listener or its result transfer failed
    Extraction(String),
    /// No paste event arrived within the configured capture timeout
    TimedOut(Duration),
}

impl fmt::Display for CaptureFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Injection(msg) => write!(f, "paste injection failed: {}", msg),
            Self::Extraction(msg) => write!(f, "clipboard extraction failed: {}", msg),
            Self::TimedOut(after) => write!(f, "no paste event after {:?}", after),
        }
    }
}

/// Result of one capture call.
///
/// `Unavailable` means the clipboard holds nothing of the requested kind;
/// `Failed` means the capture mechanism itself did not work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome<T> {
    Captured(T),
    Unavailable,
    Failed(CaptureFailure),
}

impl<T> CaptureOutcome<T> {
    pub fn is_captured(&self) -> bool {
        matches!(self, Self::Captured(_))
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Collapse to the data, treating both non-captured cases as absent.
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Captured(value) => Some(value),
            Self::Unavailable | Self::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&CaptureFailure> {
        match self {
            Self::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> CaptureOutcome<U> {
        match self {
            Self::Captured(value) => CaptureOutcome::Captured(f(value)),
            Self::Unavailable => CaptureOutcome::Unavailable,
            Self::Failed(failure) => CaptureOutcome::Failed(failure),
        }
    }
}
