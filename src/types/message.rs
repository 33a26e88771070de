//! Conversation turns and multimodal content parts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A single conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(MessageRole::System, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(MessageRole::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, text)
    }

    /// True when the content is empty after trimming whitespace.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One part of a multimodal request, in caller order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text { value: String },
    /// Local file, read and inlined as a base64 data URL when the request is built
    ImagePath { path: PathBuf },
    /// `http(s)://` URL, forwarded untouched
    ImageUrl { url: String },
    /// Already encoded image: either a full `data:` URL or bare base64
    ImageBase64 { data: String },
}

impl ContentPart {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text {
            value: value.into(),
        }
    }

    pub fn image_path(path: impl Into<PathBuf>) -> Self {
        Self::ImagePath { path: path.into() }
    }

    pub fn image_url(url: impl Into<String>) -> Self {
        Self::ImageUrl { url: url.into() }
    }

    pub fn image_base64(data: impl Into<String>) -> Self {
        Self::ImageBase64 { data: data.into() }
    }

    /// Classify an image reference given as a plain string.
    ///
    /// `http://`/`https://` become [`ContentPart::ImageUrl`], `data:` URLs become
    /// [`ContentPart::ImageBase64`], everything else is a filesystem path.
    pub fn image(source: &str) -> Self {
        let lower = source.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::image_url(source)
        } else if lower.starts_with("data:") {
            Self::image_base64(source)
        } else {
            Self::image_path(source)
        }
    }

    pub fn is_image(&self) -> bool {
        !matches!(self, Self::Text { .. })
    }
}

impl From<&str> for ContentPart {
    fn from(source: &str) -> Self {
        Self::image(source)
    }
}

impl From<String> for ContentPart {
    fn from(source: String) -> Self {
        Self::image(&source)
    }
}

impl From<PathBuf> for ContentPart {
    fn from(path: PathBuf) -> Self {
        Self::ImagePath { path }
    }
}

impl From<&std::path::Path> for ContentPart {
    fn from(path: &std::path::Path) -> Self {
        Self::ImagePath {
            path: path.to_path_buf(),
        }
    }
}
