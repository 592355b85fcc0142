//! Durable session credential adapter.
//!
//! Implements the transport's [`SessionStore`] interface on top of the
//! `auth_records` table: the credential bundle under the `"creds"` record,
//! per-key material under `"{category}-{id}"`. Every mutation the daemon
//! announces is written through so the session survives process restarts.
//!
//! Store failures never crash the process: a record that cannot be read or
//! parsed is treated as absent, and on first start (or after a corruption
//! wipe) a fresh credential bundle is generated and persisted immediately.

pub mod codec;

use std::collections::HashMap;

use async_trait::async_trait;
use database::{auth_record, Database};
use futures::future::join_all;
use tokio::sync::RwLock;
use tracing::{info, warn};
use wa_gateway::session::{
    KeyCategory, KeyMaterial, KeyMutation, SessionCreds, SessionStore, SessionStoreError,
    CREDS_RECORD_ID,
};

/// Database-backed session store.
pub struct WaAuthState {
    db: Database,
    creds: RwLock<SessionCreds>,
}

impl WaAuthState {
    /// Load the credential bundle from the store, generating and
    /// persisting a fresh one when no usable record exists.
    pub async fn init(db: Database) -> Self {
        let stored = match auth_record::get(db.pool(), CREDS_RECORD_ID).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Credential record unavailable: {}", e);
                None
            }
        };

        let creds = stored
            .and_then(|payload| codec::from_stored(CREDS_RECORD_ID, &payload))
            .and_then(|value| match serde_json::from_value::<SessionCreds>(value) {
                Ok(creds) => Some(creds),
                Err(e) => {
                    warn!("Discarding malformed credential bundle: {}", e);
                    None
                }
            });

        let creds = match creds {
            Some(creds) => {
                info!(paired = creds.is_paired(), "Restored session credentials");
                creds
            }
            None => {
                info!("No session credentials found, generating a fresh bundle");
                let fresh = SessionCreds::generate();
                if let Err(e) = persist_creds(&db, &fresh).await {
                    warn!("Failed to persist fresh credentials: {}", e);
                }
                fresh
            }
        };

        Self {
            db,
            creds: RwLock::new(creds),
        }
    }

    /// Read one key record, tolerating store failures.
    async fn read_key(&self, category: KeyCategory, id: &str) -> Option<KeyMaterial> {
        let record_id = category.record_id(id);
        let payload = match auth_record::get(self.db.pool(), &record_id).await {
            Ok(payload) => payload?,
            Err(e) => {
                warn!("Key record {} unavailable: {}", record_id, e);
                return None;
            }
        };

        let value = codec::from_stored(&record_id, &payload)?;

        // App-state sync keys get decoded into their typed form before
        // being handed back to the transport.
        if category == KeyCategory::AppStateSyncKey {
            match codec::decode_app_state_key(value) {
                Ok(key) => Some(KeyMaterial::AppStateSyncKey(key)),
                Err(e) => {
                    warn!("Discarding malformed app-state sync key {}: {}", record_id, e);
                    None
                }
            }
        } else {
            Some(KeyMaterial::Opaque(value))
        }
    }

    /// Apply one mutation: None deletes the record, Some upserts it.
    async fn apply_mutation(&self, mutation: &KeyMutation) {
        let record_id = mutation.category.record_id(&mutation.id);
        let result = match &mutation.value {
            Some(value) => {
                auth_record::put(self.db.pool(), &record_id, &codec::to_stored(value)).await
            }
            None => auth_record::delete(self.db.pool(), &record_id).await,
        };

        if let Err(e) = result {
            warn!("Key mutation for {} failed: {}", record_id, e);
        }
    }
}

async fn persist_creds(db: &Database, creds: &SessionCreds) -> Result<(), SessionStoreError> {
    let value =
        serde_json::to_value(creds).map_err(|e| SessionStoreError(e.to_string()))?;
    auth_record::put(db.pool(), CREDS_RECORD_ID, &codec::to_stored(&value))
        .await
        .map_err(|e| SessionStoreError(e.to_string()))
}

#[async_trait]
impl SessionStore for WaAuthState {
    async fn creds(&self) -> SessionCreds {
        self.creds.read().await.clone()
    }

    async fn save_creds(&self, creds: &SessionCreds) -> Result<(), SessionStoreError> {
        *self.creds.write().await = creds.clone();
        persist_creds(&self.db, creds).await
    }

    async fn get_keys(
        &self,
        category: KeyCategory,
        ids: &[String],
    ) -> HashMap<String, KeyMaterial> {
        let mut keys = HashMap::new();
        for id in ids {
            if let Some(material) = self.read_key(category, id).await {
                keys.insert(id.clone(), material);
            }
        }
        keys
    }

    async fn set_keys(&self, mutations: Vec<KeyMutation>) {
        // The whole batch is issued concurrently; the call returns once
        // every individual write has settled. Per-key failures are logged
        // in apply_mutation, not aggregated.
        join_all(mutations.iter().map(|m| self.apply_mutation(m))).await;
    }

    async fn wipe(&self) -> Result<(), SessionStoreError> {
        auth_record::delete_all(self.db.pool())
            .await
            .map_err(|e| SessionStoreError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wa_gateway::session::buffer;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_init_generates_and_persists_fresh_creds() {
        let db = test_db().await;
        let state = WaAuthState::init(db.clone()).await;

        let creds = state.creds().await;
        assert!(!creds.is_paired());

        // The bundle must already be on disk: a second init restores it.
        let state2 = WaAuthState::init(db).await;
        assert_eq!(state2.creds().await, creds);
    }

    #[tokio::test]
    async fn test_save_creds_round_trips_key_material() {
        let db = test_db().await;
        let state = WaAuthState::init(db.clone()).await;

        let mut rotated = SessionCreds::generate();
        rotated.me = Some(wa_gateway::DeviceIdentity {
            jid: "5511999990000@s.whatsapp.net".to_string(),
            name: Some("Tutor".to_string()),
        });
        state.save_creds(&rotated).await.unwrap();

        let restored = WaAuthState::init(db).await.creds().await;
        assert_eq!(restored, rotated);
        assert_eq!(restored.noise_key.private, rotated.noise_key.private);
    }

    #[tokio::test]
    async fn test_get_keys_omits_absent_ids() {
        let db = test_db().await;
        let state = WaAuthState::init(db).await;

        state
            .set_keys(vec![KeyMutation {
                category: KeyCategory::Session,
                id: "peer.0".to_string(),
                value: Some(json!({"record": {buffer::TAG: "AQID"}})),
            }])
            .await;

        let ids = vec!["peer.0".to_string(), "peer.1".to_string()];
        let keys = state.get_keys(KeyCategory::Session, &ids).await;
        assert_eq!(keys.len(), 1);
        assert!(matches!(keys.get("peer.0"), Some(KeyMaterial::Opaque(_))));
    }

    #[tokio::test]
    async fn test_set_keys_deletes_on_none() {
        let db = test_db().await;
        let state = WaAuthState::init(db.clone()).await;

        state
            .set_keys(vec![KeyMutation {
                category: KeyCategory::PreKey,
                id: "7".to_string(),
                value: Some(json!({"n": 7})),
            }])
            .await;
        assert!(auth_record::get(db.pool(), "pre-key-7")
            .await
            .unwrap()
            .is_some());

        state
            .set_keys(vec![KeyMutation {
                category: KeyCategory::PreKey,
                id: "7".to_string(),
                value: None,
            }])
            .await;
        assert!(auth_record::get(db.pool(), "pre-key-7")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_app_state_sync_keys_come_back_typed() {
        let db = test_db().await;
        let state = WaAuthState::init(db).await;

        state
            .set_keys(vec![KeyMutation {
                category: KeyCategory::AppStateSyncKey,
                id: "AAAAAQ==".to_string(),
                value: Some(json!({
                    "keyData": {buffer::TAG: "BAUG"},
                    "fingerprint": {"rawId": 3, "currentIndex": 0, "deviceIndexes": [0]},
                    "timestamp": 1700000000u64,
                })),
            }])
            .await;

        let ids = vec!["AAAAAQ==".to_string()];
        let keys = state.get_keys(KeyCategory::AppStateSyncKey, &ids).await;
        match keys.get("AAAAAQ==") {
            Some(KeyMaterial::AppStateSyncKey(key)) => {
                assert_eq!(key.key_data, vec![4, 5, 6]);
                assert_eq!(key.fingerprint.raw_id, 3);
            }
            other => panic!("expected typed app-state key, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_wipe_clears_every_record() {
        let db = test_db().await;
        let state = WaAuthState::init(db.clone()).await;

        state
            .set_keys(vec![
                KeyMutation {
                    category: KeyCategory::PreKey,
                    id: "1".to_string(),
                    value: Some(json!({"n": 1})),
                },
                KeyMutation {
                    category: KeyCategory::SenderKey,
                    id: "g.1".to_string(),
                    value: Some(json!({"n": 2})),
                },
            ])
            .await;
        assert!(auth_record::count(db.pool()).await.unwrap() >= 3);

        state.wipe().await.unwrap();
        assert_eq!(auth_record::count(db.pool()).await.unwrap(), 0);
    }
}
