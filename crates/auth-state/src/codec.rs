//! Storage codec for credential payloads.
//!
//! Payloads are JSON whose binary leaves are tagged `{"$buffer": base64}`
//! (see `wa_gateway::session::buffer`). A naive byte-array round-trip
//! through JSON would spell key material out as number arrays and lose
//! the binary/typed distinction on read, so everything entering the store
//! goes through this module.

use serde_json::Value;
use tracing::warn;
use wa_gateway::session::buffer;
use wa_gateway::AppStateSyncKeyData;

/// Serialize a payload for storage.
pub fn to_stored(value: &Value) -> String {
    value.to_string()
}

/// Parse a stored payload. Corrupt records are logged and treated as
/// absent; callers fall back to fresh state.
pub fn from_stored(record_id: &str, payload: &str) -> Option<Value> {
    match serde_json::from_str(payload) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Discarding unparsable auth record {}: {}", record_id, e);
            None
        }
    }
}

/// Decode a stored generic structure into the typed app-state sync key.
pub fn decode_app_state_key(value: Value) -> Result<AppStateSyncKeyData, serde_json::Error> {
    serde_json::from_value(value)
}

/// Whether a JSON node is a tagged binary leaf.
pub fn is_buffer_leaf(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|obj| obj.len() == 1 && obj.contains_key(buffer::TAG))
}
