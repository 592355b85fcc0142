//! OpenAI implementations of the backend traits.

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::{debug, info};
use tutor_core::{
    async_trait, BackendError, ChatBackend, HistoryEntry, SpeechToText, TextToSpeech,
};

use crate::api_types::{
    ApiError, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, SpeechRequest,
    TranscriptionResponse,
};
use crate::config::OpenAiConfig;

/// OpenAI-backed chat, transcription, and speech synthesis.
///
/// One struct implements all three backend traits; the engine holds it
/// behind each trait separately so tests can mix real and mock backends.
pub struct OpenAiBackend {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiBackend {
    /// Create a new backend with the given configuration.
    pub fn new(config: OpenAiConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                BackendError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        info!(
            "OpenAiBackend initialized (chat: {}, stt: {}, tts: {}/{})",
            config.chat_model, config.transcribe_model, config.tts_model, config.tts_voice
        );

        Ok(Self { client, config })
    }

    /// Create a backend from environment variables.
    ///
    /// See [`OpenAiConfig::from_env`] for the variables read.
    pub fn from_env() -> Result<Self, BackendError> {
        Self::new(OpenAiConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    /// Turn a non-success response into a [`BackendError::Api`].
    async fn api_error(response: reqwest::Response) -> BackendError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiError>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        BackendError::Api { status, message }
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    async fn chat(
        &self,
        system_prompt: &str,
        history: &[HistoryEntry],
        user_text: &str,
    ) -> Result<String, BackendError> {
        let url = format!("{}/v1/chat/completions", self.config.api_url);

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(system_prompt));
        messages.extend(history.iter().map(ChatMessage::from));
        messages.push(ChatMessage::user(user_text));

        let request = ChatCompletionRequest {
            model: self.config.chat_model.clone(),
            messages,
        };

        debug!("Chat completion request ({} messages)", request.messages.len());

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or(BackendError::EmptyResponse)
    }

    fn name(&self) -> &str {
        "OpenAiBackend"
    }
}

#[async_trait]
impl SpeechToText for OpenAiBackend {
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> Result<String, BackendError> {
        let url = format!("{}/v1/audio/transcriptions", self.config.api_url);

        let file = Part::bytes(audio.to_vec())
            .file_name("voice.ogg")
            .mime_str(mime_type)
            .map_err(|e| BackendError::Request(format!("invalid MIME type: {}", e)))?;

        let form = Form::new()
            .text("model", self.config.transcribe_model.clone())
            .text("language", self.config.language.clone())
            .part("file", file);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let transcription: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;

        Ok(transcription.text)
    }
}

#[async_trait]
impl TextToSpeech for OpenAiBackend {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, BackendError> {
        let url = format!("{}/v1/audio/speech", self.config.api_url);

        let request = SpeechRequest {
            model: self.config.tts_model.clone(),
            voice: self.config.tts_voice.clone(),
            input: text.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    fn mime_type(&self) -> &str {
        "audio/mpeg"
    }
}
