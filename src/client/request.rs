//! Detection request building.
//!
//! Turns a detection intent (prompt, conversation, prompt + images) into the
//! chat-completion-shaped body the detection endpoint expects:
//! `{"model": ..., "messages": [...], "user": ...}`. All validation happens
//! here, before any network attempt. Local images are read and inlined as
//! base64 data URLs; URL images are forwarded untouched and never fetched.

use crate::types::message::{ContentPart, Message, MessageRole};
use crate::{Error, Result};
use base64::Engine as _;
use serde::Serialize;
use std::path::Path;

pub const DEFAULT_TEXT_MODEL: &str = "Xiangxin-Guardrails-Text";
pub const DEFAULT_VISION_MODEL: &str = "Xiangxin-Guardrails-VL";

const MAX_CONTENT_CHARS: usize = 1_000_000;

/// Body of a detection call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireMessage {
    pub role: MessageRole,
    pub content: WireContent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WireContent {
    Text(String),
    Parts(Vec<WirePart>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WirePart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

impl DetectionRequest {
    /// Single user prompt.
    pub fn prompt(content: &str, user_id: Option<&str>) -> Result<Self> {
        let text = checked_text(content, "content")?;
        if text.is_empty() {
            return Err(Error::validation("content cannot be empty", "content"));
        }
        Ok(Self::text(
            DEFAULT_TEXT_MODEL,
            vec![(MessageRole::User, text)],
            user_id,
        ))
    }

    /// Full conversation history. Must end with a user turn.
    pub fn conversation(
        messages: &[Message],
        model: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<Self> {
        let turns = collect_turns(messages)?;
        if turns.last().map(|(role, _)| *role) != Some(MessageRole::User) {
            let last_sent = messages
                .iter()
                .rposition(|m| !m.is_blank())
                .unwrap_or(messages.len() - 1);
            return Err(Error::validation(
                "conversation must end with a user turn",
                format!("messages[{}].role", last_sent),
            ));
        }
        Ok(Self::text(model_or(model, DEFAULT_TEXT_MODEL), turns, user_id))
    }

    /// A prompt and the model's answer to it, checked in context.
    ///
    /// Always sent as two turns; the prompt turn may be empty.
    pub fn response_ctx(prompt: &str, response: &str, user_id: Option<&str>) -> Result<Self> {
        let prompt = checked_text(prompt, "prompt")?;
        let response = checked_text(response, "response")?;
        if prompt.is_empty() && response.is_empty() {
            return Err(Error::validation(
                "prompt and response cannot both be empty",
                "response",
            ));
        }
        Ok(Self::text(
            DEFAULT_TEXT_MODEL,
            vec![(MessageRole::User, prompt), (MessageRole::Assistant, response)],
            user_id,
        ))
    }

    /// A (possibly empty) text prompt plus one or more images.
    pub fn prompt_images(
        prompt: &str,
        images: &[ContentPart],
        model: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<Self> {
        let text = checked_text(prompt, "prompt")?;
        if images.is_empty() {
            let msg = if text.is_empty() {
                "prompt and images cannot both be empty"
            } else {
                "images cannot be empty"
            };
            return Err(Error::validation(msg, "images"));
        }

        let mut parts = Vec::with_capacity(images.len() + 1);
        if !text.is_empty() {
            parts.push(WirePart::Text { text });
        }
        for (idx, image) in images.iter().enumerate() {
            let field = format!("images[{}]", idx);
            if !image.is_image() {
                return Err(Error::validation("expected an image part", field));
            }
            parts.push(WirePart::ImageUrl {
                image_url: ImageUrl {
                    url: image_url(image, &field)?,
                },
            });
        }

        Ok(Self {
            model: model_or(model, DEFAULT_VISION_MODEL).to_string(),
            messages: vec![WireMessage {
                role: MessageRole::User,
                content: WireContent::Parts(parts),
            }],
            user: normalize_user(user_id),
        })
    }

    pub fn to_json(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| {
            Error::validation(format!("request is not serializable: {}", e), "request")
        })
    }

    fn text(model: &str, turns: Vec<(MessageRole, String)>, user_id: Option<&str>) -> Self {
        Self {
            model: model.to_string(),
            messages: turns
                .into_iter()
                .map(|(role, text)| WireMessage {
                    role,
                    content: WireContent::Text(text),
                })
                .collect(),
            user: normalize_user(user_id),
        }
    }
}

fn model_or<'a>(model: Option<&'a str>, default: &'a str) -> &'a str {
    model.map(str::trim).filter(|m| !m.is_empty()).unwrap_or(default)
}

fn normalize_user(user_id: Option<&str>) -> Option<String> {
    user_id
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
}

/// Trim and enforce the length limit.
fn checked_text(content: &str, field: &str) -> Result<String> {
    let text = content.trim();
    if text.chars().count() > MAX_CONTENT_CHARS {
        return Err(Error::validation(
            format!("content too long (max {} characters)", MAX_CONTENT_CHARS),
            field,
        ));
    }
    Ok(text.to_string())
}

/// Trimmed, non-blank turns in order. Blank turns are dropped.
fn collect_turns(messages: &[Message]) -> Result<Vec<(MessageRole, String)>> {
    if messages.is_empty() {
        return Err(Error::validation("messages cannot be empty", "messages"));
    }
    let mut turns = Vec::with_capacity(messages.len());
    for (idx, msg) in messages.iter().enumerate() {
        let text = checked_text(&msg.content, &format!("messages[{}].content", idx))?;
        if !text.is_empty() {
            turns.push((msg.role, text));
        }
    }
    if turns.is_empty() {
        return Err(Error::validation("all messages are empty", "messages"));
    }
    Ok(turns)
}

/// MIME type for a supported image file extension.
pub(crate) fn image_mime_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mt = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => return None,
    };
    Some(mt)
}

fn image_url(part: &ContentPart, field: &str) -> Result<String> {
    match part {
        ContentPart::ImagePath { path } => encode_image_file(path, field),
        ContentPart::ImageUrl { url } => {
            let url = url.trim();
            let lower = url.to_ascii_lowercase();
            if !(lower.starts_with("http://") || lower.starts_with("https://")) {
                return Err(Error::validation(
                    format!("image url must be http(s): '{}'", url),
                    field,
                ));
            }
            Ok(url.to_string())
        }
        ContentPart::ImageBase64 { data } => {
            let data = data.trim();
            if data.is_empty() {
                return Err(Error::validation("image data cannot be empty", field));
            }
            if data.starts_with("data:") {
                if !data.starts_with("data:image/") || !data.contains(";base64,") {
                    return Err(Error::validation(
                        "data url must be a base64 encoded image",
                        field,
                    ));
                }
                return Ok(data.to_string());
            }
            base64::engine::general_purpose::STANDARD
                .decode(data)
                .map_err(|e| Error::validation(format!("invalid base64 image: {}", e), field))?;
            Ok(format!("data:image/jpeg;base64,{}", data))
        }
        ContentPart::Text { .. } => Err(Error::validation("expected an image part", field)),
    }
}

fn encode_image_file(path: &Path, field: &str) -> Result<String> {
    if path.as_os_str().is_empty() {
        return Err(Error::validation("image path cannot be empty", field));
    }
    let mime = image_mime_type(path).ok_or_else(|| {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!("'.{}'", e))
            .unwrap_or_else(|| "(none)".to_string());
        Error::validation(
            format!(
                "unsupported image type {}; expected jpg, jpeg, png, gif or webp",
                ext
            ),
            field,
        )
    })?;
    let bytes = std::fs::read(path).map_err(|e| {
        let msg = if e.kind() == std::io::ErrorKind::NotFound {
            format!("image file not found: {}", path.display())
        } else {
            format!("failed to read image {}: {}", path.display(), e)
        };
        Error::validation(msg, field)
    })?;
    let data = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{};base64,{}", mime, data))
}
