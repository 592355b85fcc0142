//! Gateway-backed implementation of the engine's transport seam.

use async_trait::async_trait;
use engine::{EngineError, Transport};
use wa_gateway::{Presence, WaClient};

/// Sends engine output through the gateway daemon.
#[derive(Debug, Clone)]
pub struct WaTransport {
    client: WaClient,
}

impl WaTransport {
    pub fn new(client: WaClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for WaTransport {
    async fn send_text(&self, recipient: &str, text: &str) -> Result<(), EngineError> {
        self.client
            .send_text(recipient, text)
            .await
            .map(|_| ())
            .map_err(|e| EngineError::Transport(e.to_string()))
    }

    async fn send_voice(
        &self,
        recipient: &str,
        audio: &[u8],
        mime_type: &str,
    ) -> Result<(), EngineError> {
        self.client
            .send_voice(recipient, audio, mime_type)
            .await
            .map(|_| ())
            .map_err(|e| EngineError::Transport(e.to_string()))
    }

    async fn set_presence(&self, recipient: &str, presence: Presence) -> Result<(), EngineError> {
        self.client
            .send_presence(recipient, presence)
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))
    }

    async fn fetch_media(&self, media_id: &str) -> Result<Vec<u8>, EngineError> {
        self.client
            .fetch_media(media_id)
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))
    }
}
