//! Clipboard snapshot value objects

use serde::Serialize;

use super::CaptureRequest;

/// A file taken from the clipboard.
/// Holds the first file of a paste event, fully read into memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClipboardFile {
    pub name: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub content: Vec<u8>,
}

impl ClipboardFile {
    /// Create a clipboard file from its parts
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            content,
        }
    }

    /// Get the size in bytes
    pub fn size_bytes(&self) -> usize {
        self.content.len()
    }

    /// Get human-readable size
    pub fn human_readable_size(&self) -> String {
        let bytes = self.size_bytes();
        if bytes < 1024 {
            format!("{} B", bytes)
        } else if bytes < 1024 * 1024 {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        } else {
            format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
        }
    }
}

/// What one paste event yielded for one capture request.
///
/// Produced only in direct response to a single paste event and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ClipboardSnapshot {
    Types(Vec<String>),
    Text(String),
    Html(String),
    File(ClipboardFile),
}

impl ClipboardSnapshot {
    /// The request this snapshot answers
    pub const fn request(&self) -> CaptureRequest {
        match self {
            Self::Types(_) => CaptureRequest::Types,
            Self::Text(_) => CaptureRequest::PlainText,
            Self::Html(_) => CaptureRequest::RichText,
            Self::File(_) => CaptureRequest::File,
        }
    }

    pub fn into_types(self) -> Option<Vec<String>> {
        match self {
            Self::Types(types) => Some(types),
            _ => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn into_html(self) -> Option<String> {
        match self {
            Self::Html(html) => Some(html),
            _ => None,
        }
    }

    pub fn into_file(self) -> Option<ClipboardFile> {
        match self {
            Self::File(file) => Some(file),
            _ => None,
        }
    }
}
