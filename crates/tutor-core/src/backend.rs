//! Backend traits the conversation engine delegates to.
//!
//! The language-model, transcription, and speech calls are opaque external
//! operations. Implementations live in their own crates (`openai-backend`
//! for production, `mock-backend` for tests).

use async_trait::async_trait;
use thiserror::Error;

use crate::profile::HistoryEntry;

/// Errors from any of the three backends.
///
/// The engine treats every variant the same way: the turn is aborted with
/// a fallback (chat) or silently dropped (voice). A bounded client timeout
/// surfaces as [`BackendError::Request`].
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend is misconfigured (missing key, bad URL).
    #[error("backend configuration error: {0}")]
    Configuration(String),

    /// The request could not be completed (network, timeout).
    #[error("backend request failed: {0}")]
    Request(String),

    /// The backend answered with an error status.
    #[error("backend API error {status}: {message}")]
    Api { status: u16, message: String },

    /// The backend answered but produced nothing usable.
    #[error("backend returned an empty response")]
    EmptyResponse,
}

/// A chat-completion backend.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Produce a reply given the system instruction, prior history, and the
    /// new user input.
    async fn chat(
        &self,
        system_prompt: &str,
        history: &[HistoryEntry],
        user_text: &str,
    ) -> Result<String, BackendError>;

    /// Implementation name, for logs.
    fn name(&self) -> &str;
}

/// A speech-to-text backend.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe an audio payload. An empty string means nothing usable
    /// was heard; the engine aborts the turn in that case.
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> Result<String, BackendError>;
}

/// A text-to-speech backend.
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Synthesize speech for the given text.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, BackendError>;

    /// MIME type of the synthesized audio.
    fn mime_type(&self) -> &str;
}
