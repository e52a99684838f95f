//! Provider-agnostic LLM completion interface.

use async_trait::async_trait;

use crate::error::LlmError;

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
}

/// A single chat message.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// An inline image attached to the user turn (diagnosis photos).
#[derive(Debug, Clone)]
pub struct ImagePart {
    /// Raw base64 payload, without the `data:` prefix.
    pub data_base64: String,
    /// MIME type, e.g. `image/jpeg`.
    pub mime_type: String,
}

impl ImagePart {
    /// Split a `data:image/...;base64,...` URL into an image part.
    ///
    /// Callers validate the URL shape beforehand; a malformed value yields
    /// `None` rather than a panic.
    pub fn from_data_url(url: &str) -> Option<Self> {
        let rest = url.strip_prefix("data:")?;
        let (mime_type, payload) = rest.split_once(";base64,")?;
        if mime_type.is_empty() || payload.is_empty() {
            return None;
        }
        Some(Self {
            data_base64: payload.to_string(),
            mime_type: mime_type.to_string(),
        })
    }
}

/// A completion request: messages, optional images, sampling knobs.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub images: Vec<ImagePart>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            images: Vec::new(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_images(mut self, images: Vec<ImagePart>) -> Self {
        self.images = images;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Concatenated system messages, if any.
    pub fn system_text(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n\n"))
        }
    }

    /// Concatenated user messages.
    pub fn user_text(&self) -> String {
        self.messages
            .iter()
            .filter(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    MaxTokens,
    Other,
}

/// A completion response.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub finish_reason: FinishReason,
}

/// Backend-agnostic completion provider.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Model identifier, for logging.
    fn model_name(&self) -> &str;

    /// Run a single completion call. No retries at this layer.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_part_from_data_url() {
        let part = ImagePart::from_data_url("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(part.mime_type, "image/png");
        assert_eq!(part.data_base64, "aGVsbG8=");
    }

    #[test]
    fn image_part_rejects_plain_url() {
        assert!(ImagePart::from_data_url("https://example.com/x.png").is_none());
        assert!(ImagePart::from_data_url("data:image/png;base64,").is_none());
    }

    #[test]
    fn system_and_user_text_split() {
        let req = CompletionRequest::new(vec![
            ChatMessage::system("you are helpful"),
            ChatMessage::user("first"),
            ChatMessage::user("second"),
        ]);
        assert_eq!(req.system_text().as_deref(), Some("you are helpful"));
        assert_eq!(req.user_text(), "first\n\nsecond");
    }
}
