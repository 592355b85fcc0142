//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A student row, identified by WhatsApp JID.
///
/// Level, mode, and history are stored in their string/JSON forms; the
/// engine converts to and from the typed domain representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct StudentRow {
    /// WhatsApp JID (e.g., "5511999990000@s.whatsapp.net")
    pub jid: String,
    /// Push name, if known
    pub display_name: Option<String>,
    /// Level name (e.g., "Beginner")
    pub level: String,
    /// Accumulated XP
    pub xp: i64,
    /// Mode name (e.g., "chat")
    pub mode: String,
    /// Conversation history as a JSON array
    pub history: String,
}

/// A session credential record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AuthRecord {
    /// "creds" or "{category}-{id}"
    pub record_id: String,
    /// JSON payload with tagged-base64 binary leaves
    pub payload: String,
}
