//! Outbound RPC parameter types.

use serde::{Deserialize, Serialize};

/// Parameters for the `send` RPC.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendParams {
    /// Recipient JID.
    pub recipient: String,

    /// Message text.
    pub message: String,

    /// Sending account for multi-account mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
}

impl SendParams {
    /// Create send parameters for a text message.
    pub fn text(recipient: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            message: message.into(),
            account: None,
        }
    }
}

/// Parameters for the `sendVoice` RPC. The payload travels base64-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendVoiceParams {
    /// Recipient JID.
    pub recipient: String,

    /// Base64-encoded audio payload.
    pub data: String,

    /// MIME type of the payload.
    pub mime_type: String,

    /// Sending account for multi-account mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
}

/// Presence indicators shown to the peer. Best-effort; failures are
/// logged and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Presence {
    /// "typing..."
    Composing,
    /// "recording audio..."
    Recording,
    /// Clear the indicator.
    Paused,
}

/// Result of a send operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResult {
    /// Server-assigned message id.
    #[serde(default)]
    pub message_id: String,

    /// Server timestamp (milliseconds since epoch).
    #[serde(default)]
    pub timestamp: u64,
}
