//! Inbound events from the gateway daemon.

use serde::{Deserialize, Serialize};

use crate::session::{KeyCategory, KeyMutation, SessionCreds};

/// A message received by the account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEvent {
    /// Sender JID.
    #[serde(default)]
    pub sender: String,

    /// Chat JID the message was delivered to. For a direct chat this is
    /// the peer (or, for a self-chat, the own JID); for a group it is the
    /// group JID.
    #[serde(default)]
    pub recipient: String,

    /// Sender push name, if the transport reported one.
    #[serde(default)]
    pub push_name: Option<String>,

    /// Whether the message came from a group conversation.
    #[serde(default)]
    pub is_group: bool,

    /// Whether the account itself sent this message (own-device echo).
    #[serde(default)]
    pub from_self: bool,

    /// Text body, if any.
    #[serde(default)]
    pub text: Option<String>,

    /// Voice-note payload reference, if any.
    #[serde(default)]
    pub audio: Option<AudioRef>,

    /// Message timestamp (milliseconds since epoch).
    #[serde(default)]
    pub timestamp: u64,
}

/// Reference to a downloadable audio payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioRef {
    pub media_id: String,
    #[serde(default = "default_audio_mime")]
    pub mime_type: String,
}

fn default_audio_mime() -> String {
    "audio/ogg; codecs=opus".to_string()
}

/// Details of a connection close.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionClose {
    /// Transport status code (e.g., 401 for logged out).
    #[serde(default)]
    pub status_code: Option<u16>,

    /// Failure description from the daemon.
    #[serde(default)]
    pub message: Option<String>,
}

/// A request from the daemon for stored key material.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeysRequest {
    pub request_id: u64,
    pub category: KeyCategory,
    pub ids: Vec<String>,
}

/// Every event the daemon can emit, resolved into a tagged union at the
/// stream boundary so the rest of the pipeline never re-inspects raw JSON.
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    /// A new pairing QR challenge. Valid until the next QR or until the
    /// connection opens.
    Qr { code: String },

    /// The connection reached the open state.
    Open,

    /// The connection closed; the supervisor classifies the failure.
    Closed(ConnectionClose),

    /// The credential bundle rotated and must be re-persisted.
    CredsUpdate(Box<SessionCreds>),

    /// Per-key material changed and must be written through.
    KeysMutation(Vec<KeyMutation>),

    /// The daemon needs stored key material to decrypt traffic.
    KeysRequest(KeysRequest),

    /// An inbound message.
    Message(Box<MessageEvent>),
}
