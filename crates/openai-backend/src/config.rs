//! Configuration for the OpenAI backends.

use std::env;
use std::time::Duration;

use tutor_core::BackendError;

/// Default chat model.
const DEFAULT_CHAT_MODEL: &str = "gpt-4o";

/// Default transcription model.
const DEFAULT_TRANSCRIBE_MODEL: &str = "whisper-1";

/// Default speech model and voice.
const DEFAULT_TTS_MODEL: &str = "tts-1-hd";
const DEFAULT_TTS_VOICE: &str = "onyx";

/// Default bound on any single backend request.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for [`OpenAiBackend`](crate::OpenAiBackend).
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key.
    pub api_key: String,
    /// API base URL (e.g., "https://api.openai.com").
    pub api_url: String,
    /// Chat completion model.
    pub chat_model: String,
    /// Transcription model.
    pub transcribe_model: String,
    /// Speech synthesis model.
    pub tts_model: String,
    /// Speech synthesis voice.
    pub tts_voice: String,
    /// Language hint for transcription.
    pub language: String,
    /// Bound on any single request; a timeout is a generic backend failure.
    pub request_timeout: Duration,
}

impl OpenAiConfig {
    /// Create a configuration with the given API key and defaults for
    /// everything else.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: "https://api.openai.com".to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            transcribe_model: DEFAULT_TRANSCRIBE_MODEL.to_string(),
            tts_model: DEFAULT_TTS_MODEL.to_string(),
            tts_voice: DEFAULT_TTS_VOICE.to_string(),
            language: "en".to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Required: `OPENAI_API_KEY`. Optional: `OPENAI_API_URL`,
    /// `OPENAI_CHAT_MODEL`, `OPENAI_TRANSCRIBE_MODEL`, `OPENAI_TTS_MODEL`,
    /// `OPENAI_TTS_VOICE`, `OPENAI_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, BackendError> {
        let api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| BackendError::Configuration("OPENAI_API_KEY is required".to_string()))?;

        let mut config = Self::new(api_key);
        if let Ok(url) = env::var("OPENAI_API_URL") {
            config.api_url = url;
        }
        if let Ok(model) = env::var("OPENAI_CHAT_MODEL") {
            config.chat_model = model;
        }
        if let Ok(model) = env::var("OPENAI_TRANSCRIBE_MODEL") {
            config.transcribe_model = model;
        }
        if let Ok(model) = env::var("OPENAI_TTS_MODEL") {
            config.tts_model = model;
        }
        if let Ok(voice) = env::var("OPENAI_TTS_VOICE") {
            config.tts_voice = voice;
        }
        if let Ok(secs) = env::var("OPENAI_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                BackendError::Configuration("OPENAI_TIMEOUT_SECS must be an integer".to_string())
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OpenAiConfig::new("sk-test");
        assert_eq!(config.chat_model, "gpt-4o");
        assert_eq!(config.transcribe_model, "whisper-1");
        assert_eq!(config.tts_model, "tts-1-hd");
        assert_eq!(config.tts_voice, "onyx");
        assert_eq!(config.language, "en");
    }
}
