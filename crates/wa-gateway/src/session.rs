//! Session credentials and the durable key store interface.
//!
//! The daemon holds no state at rest: the client supplies the credential
//! bundle on `startSession` and answers `keys.request` events from its
//! [`SessionStore`]. Key material is raw bytes at arbitrary depth, so the
//! wire (and storage) representation tags every binary leaf as
//! `{"$buffer": "<base64>"}` instead of letting serde_json spell bytes out
//! as number arrays. The `buffer` serde module implements both directions.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Record id under which the credential bundle itself is stored.
pub const CREDS_RECORD_ID: &str = "creds";

/// Error from a [`SessionStore`] implementation.
///
/// Stores tolerate per-record failures internally; this error only
/// surfaces wholesale failures (persisting the bundle, wiping the store).
#[derive(Debug, Error)]
#[error("session store error: {0}")]
pub struct SessionStoreError(pub String);

/// Serde helpers for binary leaves: `Vec<u8>` <-> `{"$buffer": "<base64>"}`.
pub mod buffer {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// JSON object key marking a tagged binary leaf.
    pub const TAG: &str = "$buffer";

    #[derive(Serialize, Deserialize)]
    struct Tagged {
        #[serde(rename = "$buffer")]
        data: String,
    }

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        Tagged {
            data: STANDARD.encode(bytes),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let tagged = Tagged::deserialize(deserializer)?;
        STANDARD.decode(&tagged.data).map_err(D::Error::custom)
    }
}

/// An asymmetric key pair. The daemon performs the actual curve operations;
/// the client only stores and forwards the material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPair {
    #[serde(with = "buffer")]
    pub public: Vec<u8>,
    #[serde(with = "buffer")]
    pub private: Vec<u8>,
}

impl KeyPair {
    /// Generate fresh random key material. The daemon replaces this during
    /// the pairing handshake via a `creds.update` event.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let mut public = vec![0u8; 32];
        let mut private = vec![0u8; 32];
        rng.fill_bytes(&mut public);
        rng.fill_bytes(&mut private);
        Self { public, private }
    }
}

/// A signed pre-key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedPreKey {
    pub key_pair: KeyPair,
    #[serde(with = "buffer")]
    pub signature: Vec<u8>,
    pub key_id: u32,
}

/// The paired account identity, once pairing has completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceIdentity {
    /// Own JID (e.g., "5511999990000@s.whatsapp.net").
    pub jid: String,
    /// Push name registered for the account.
    #[serde(default)]
    pub name: Option<String>,
}

/// The session credential bundle.
///
/// Persisted under [`CREDS_RECORD_ID`]; absence of the record means there
/// is no session and the daemon will start a fresh QR pairing flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreds {
    pub noise_key: KeyPair,
    pub signed_identity_key: KeyPair,
    pub signed_pre_key: SignedPreKey,
    pub registration_id: u32,
    #[serde(with = "buffer")]
    pub adv_secret_key: Vec<u8>,
    /// Set once pairing completes.
    #[serde(default)]
    pub me: Option<DeviceIdentity>,
    /// Counter of processed app-state patches.
    #[serde(default)]
    pub next_pre_key_id: u32,
}

impl SessionCreds {
    /// Synthesize a fresh, unpaired credential bundle.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let mut adv_secret_key = vec![0u8; 32];
        rng.fill_bytes(&mut adv_secret_key);

        let mut signature = vec![0u8; 64];
        rng.fill_bytes(&mut signature);

        Self {
            noise_key: KeyPair::generate(),
            signed_identity_key: KeyPair::generate(),
            signed_pre_key: SignedPreKey {
                key_pair: KeyPair::generate(),
                signature,
                key_id: 1,
            },
            registration_id: rng.next_u32() & 0x3fff,
            adv_secret_key,
            me: None,
            next_pre_key_id: 1,
        }
    }

    /// Whether this bundle belongs to a completed pairing.
    pub fn is_paired(&self) -> bool {
        self.me.is_some()
    }
}

/// Categories of per-key session material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyCategory {
    PreKey,
    Session,
    SenderKey,
    AppStateSyncKey,
    AppStateSyncVersion,
}

impl KeyCategory {
    /// Storage name, also the record-id prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreKey => "pre-key",
            Self::Session => "session",
            Self::SenderKey => "sender-key",
            Self::AppStateSyncKey => "app-state-sync-key",
            Self::AppStateSyncVersion => "app-state-sync-version",
        }
    }

    /// Record id for one key in this category.
    pub fn record_id(&self, id: &str) -> String {
        format!("{}-{}", self.as_str(), id)
    }
}

impl fmt::Display for KeyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pre-key" => Ok(Self::PreKey),
            "session" => Ok(Self::Session),
            "sender-key" => Ok(Self::SenderKey),
            "app-state-sync-key" => Ok(Self::AppStateSyncKey),
            "app-state-sync-version" => Ok(Self::AppStateSyncVersion),
            other => Err(format!("unknown key category: {}", other)),
        }
    }
}

/// Fingerprint of an app-state sync key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppStateSyncKeyFingerprint {
    pub raw_id: u32,
    pub current_index: u32,
    #[serde(default)]
    pub device_indexes: Vec<u32>,
}

/// Typed app-state sync key, decoded from the generic stored structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppStateSyncKeyData {
    #[serde(with = "buffer")]
    pub key_data: Vec<u8>,
    pub fingerprint: AppStateSyncKeyFingerprint,
    pub timestamp: u64,
}

/// Key material returned from the store.
///
/// Most categories round-trip as opaque JSON; app-state sync keys get the
/// extra decode into their typed form before being handed to the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyMaterial {
    AppStateSyncKey(AppStateSyncKeyData),
    Opaque(serde_json::Value),
}

/// One key mutation from a `keys.mutation` event. `value: None` deletes
/// the record, `Some` upserts it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyMutation {
    pub category: KeyCategory,
    pub id: String,
    pub value: Option<serde_json::Value>,
}

/// Durable credential/key storage the transport relies on.
///
/// Implementations persist every mutation so the session survives process
/// restarts. Per-key read/write failures are tolerated internally (a
/// missing record is not an error); only wholesale operations report
/// failure.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The current in-memory credential bundle.
    async fn creds(&self) -> SessionCreds;

    /// Persist the bundle after a credential-rotation event.
    async fn save_creds(&self, creds: &SessionCreds) -> Result<(), SessionStoreError>;

    /// Fetch keys by category and id. Absent ids are omitted from the map.
    async fn get_keys(
        &self,
        category: KeyCategory,
        ids: &[String],
    ) -> HashMap<String, KeyMaterial>;

    /// Apply a batch of key mutations. Individual failures are logged by
    /// the implementation, not surfaced.
    async fn set_keys(&self, mutations: Vec<KeyMutation>);

    /// Delete every stored record (corruption reset).
    async fn wipe(&self) -> Result<(), SessionStoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_tagging_on_the_wire() {
        let pair = KeyPair {
            public: vec![1, 2, 3],
            private: vec![4, 5, 6],
        };
        let json = serde_json::to_value(&pair).unwrap();
        assert_eq!(json["public"][buffer::TAG], "AQID");
        assert_eq!(json["private"][buffer::TAG], "BAUG");
    }

    #[test]
    fn test_creds_round_trip_is_byte_identical() {
        let creds = SessionCreds::generate();
        let json = serde_json::to_string(&creds).unwrap();
        let back: SessionCreds = serde_json::from_str(&json).unwrap();
        assert_eq!(back, creds);
        assert_eq!(back.noise_key.private, creds.noise_key.private);
        assert_eq!(back.signed_pre_key.signature, creds.signed_pre_key.signature);
    }

    #[test]
    fn test_generated_bundles_are_distinct() {
        let a = SessionCreds::generate();
        let b = SessionCreds::generate();
        assert_ne!(a.noise_key.private, b.noise_key.private);
        assert!(!a.is_paired());
    }

    #[test]
    fn test_category_record_ids() {
        assert_eq!(KeyCategory::PreKey.record_id("42"), "pre-key-42");
        assert_eq!(
            KeyCategory::AppStateSyncKey.record_id("AAAAAA=="),
            "app-state-sync-key-AAAAAA=="
        );
    }

    #[test]
    fn test_category_round_trips_through_str() {
        for category in [
            KeyCategory::PreKey,
            KeyCategory::Session,
            KeyCategory::SenderKey,
            KeyCategory::AppStateSyncKey,
            KeyCategory::AppStateSyncVersion,
        ] {
            assert_eq!(category.as_str().parse::<KeyCategory>().unwrap(), category);
        }
    }
}
