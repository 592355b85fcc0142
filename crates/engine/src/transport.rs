//! Outbound transport seam.

use std::sync::Mutex;

use async_trait::async_trait;
use wa_gateway::Presence;

use crate::error::EngineError;

/// The transport operations the engine needs.
///
/// Abstracted so the pipeline can be exercised in tests without a gateway
/// daemon; the bot binary implements this for [`wa_gateway::WaClient`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a text message.
    async fn send_text(&self, recipient: &str, text: &str) -> Result<(), EngineError>;

    /// Send a voice note.
    async fn send_voice(
        &self,
        recipient: &str,
        audio: &[u8],
        mime_type: &str,
    ) -> Result<(), EngineError>;

    /// Set a presence indicator. Best-effort; callers ignore failures.
    async fn set_presence(&self, recipient: &str, presence: Presence) -> Result<(), EngineError>;

    /// Download a media payload by id.
    async fn fetch_media(&self, media_id: &str) -> Result<Vec<u8>, EngineError>;
}

/// A transport that records everything it is asked to send.
///
/// Used by the engine tests; kept public so downstream crates can drive
/// the pipeline without a daemon.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    /// Sent text messages as (recipient, text).
    pub texts: Mutex<Vec<(String, String)>>,
    /// Sent voice notes as (recipient, payload length).
    pub voices: Mutex<Vec<(String, usize)>>,
    /// Media payload served by fetch_media.
    pub media: Mutex<Vec<u8>>,
    /// When true, send_text fails.
    pub fail_text_sends: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provide the payload fetch_media returns.
    pub fn with_media(media: Vec<u8>) -> Self {
        Self {
            media: Mutex::new(media),
            ..Self::default()
        }
    }

    /// All sent texts, cloned out.
    pub fn sent_texts(&self) -> Vec<(String, String)> {
        self.texts.lock().unwrap().clone()
    }

    /// Number of voice notes sent.
    pub fn voice_count(&self) -> usize {
        self.voices.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_text(&self, recipient: &str, text: &str) -> Result<(), EngineError> {
        if self.fail_text_sends {
            return Err(EngineError::Transport("scripted send failure".to_string()));
        }
        self.texts
            .lock()
            .unwrap()
            .push((recipient.to_string(), text.to_string()));
        Ok(())
    }

    async fn send_voice(
        &self,
        recipient: &str,
        audio: &[u8],
        _mime_type: &str,
    ) -> Result<(), EngineError> {
        self.voices
            .lock()
            .unwrap()
            .push((recipient.to_string(), audio.len()));
        Ok(())
    }

    async fn set_presence(&self, _recipient: &str, _presence: Presence) -> Result<(), EngineError> {
        Ok(())
    }

    async fn fetch_media(&self, _media_id: &str) -> Result<Vec<u8>, EngineError> {
        Ok(self.media.lock().unwrap().clone())
    }
}
