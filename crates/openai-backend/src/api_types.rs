//! Request/response types for the OpenAI API.

use serde::{Deserialize, Serialize};
use tutor_core::{HistoryEntry, Role};

/// A chat message in API format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

impl From<&HistoryEntry> for ChatMessage {
    fn from(entry: &HistoryEntry) -> Self {
        let role = match entry.role {
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        Self {
            role: role.to_string(),
            content: entry.content.clone(),
        }
    }
}

/// Chat completion request body.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

/// Chat completion response body.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
}

/// One completion choice.
#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

/// Message content of a completion choice.
#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Transcription response body.
#[derive(Debug, Deserialize)]
pub struct TranscriptionResponse {
    #[serde(default)]
    pub text: String,
}

/// Speech synthesis request body.
#[derive(Debug, Serialize)]
pub struct SpeechRequest {
    pub model: String,
    pub voice: String,
    pub input: String,
}

/// API error envelope.
#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

/// API error details.
#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
}
