//! Gateway daemon HTTP client.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::session::{KeyMaterial, SessionCreds};
use crate::types::{Presence, SendParams, SendResult, SendVoiceParams};

/// JSON-RPC 2.0 request structure.
#[derive(Debug, Serialize)]
struct RpcRequest<'a, T: Serialize> {
    jsonrpc: &'static str,
    method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<T>,
    id: u64,
}

/// JSON-RPC 2.0 response structure.
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    #[allow(dead_code)]
    jsonrpc: String,
    result: Option<T>,
    error: Option<RpcError>,
    #[allow(dead_code)]
    id: u64,
}

/// JSON-RPC 2.0 error.
#[derive(Debug, Deserialize)]
struct RpcError {
    code: i32,
    message: String,
}

/// Parameters for the `startSession` RPC.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StartSessionParams<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    creds: Option<&'a SessionCreds>,
    #[serde(skip_serializing_if = "Option::is_none")]
    account: Option<String>,
}

/// Parameters for the `respondKeys` RPC.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RespondKeysParams {
    request_id: u64,
    keys: HashMap<String, KeyMaterial>,
}

/// Parameters for the `sendPresence` RPC.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PresenceParams {
    recipient: String,
    presence: Presence,
    #[serde(skip_serializing_if = "Option::is_none")]
    account: Option<String>,
}

/// Self-identity response.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JidResponse {
    String(String),
    Object { jid: String },
}

/// Client for communicating with the WhatsApp gateway daemon.
#[derive(Clone)]
pub struct WaClient {
    http: Client,
    config: GatewayConfig,
    request_id: Arc<AtomicU64>,
    connected: Arc<AtomicBool>,
}

impl WaClient {
    /// Connect to the gateway daemon.
    pub async fn connect(config: GatewayConfig) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(GatewayError::Http)?;

        let client = Self {
            http,
            config,
            request_id: Arc::new(AtomicU64::new(1)),
            connected: Arc::new(AtomicBool::new(false)),
        };

        // Verify connection with health check
        if client.health_check().await? {
            client.connected.store(true, Ordering::SeqCst);
            info!("Connected to gateway daemon at {}", client.config.base_url);
        } else {
            return Err(GatewayError::HealthCheckFailed);
        }

        Ok(client)
    }

    /// Check if currently connected to the daemon.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Perform a health check against the daemon.
    pub async fn health_check(&self) -> Result<bool, GatewayError> {
        let url = self.config.check_url();
        debug!("Health check: {}", url);

        match self.http.get(&url).send().await {
            Ok(resp) => {
                let ok = resp.status().is_success();
                self.connected.store(ok, Ordering::SeqCst);
                Ok(ok)
            }
            Err(e) => {
                self.connected.store(false, Ordering::SeqCst);
                Err(GatewayError::Http(e))
            }
        }
    }

    /// Start (or resume) a WhatsApp session.
    ///
    /// With credentials, the daemon resumes the existing session; without,
    /// it begins a fresh pairing flow and emits `qr` events.
    pub async fn start_session(&self, creds: Option<&SessionCreds>) -> Result<(), GatewayError> {
        let params = StartSessionParams {
            creds,
            account: self.config.account.clone(),
        };
        let _: serde_json::Value = self.rpc_call("startSession", Some(params)).await?;
        Ok(())
    }

    /// Send a text message to a recipient JID.
    pub async fn send_text(
        &self,
        recipient: &str,
        message: &str,
    ) -> Result<SendResult, GatewayError> {
        let mut params = SendParams::text(recipient, message);
        params.account = self.config.account.clone();
        self.rpc_call("send", Some(params)).await
    }

    /// Send a voice note to a recipient JID.
    pub async fn send_voice(
        &self,
        recipient: &str,
        audio: &[u8],
        mime_type: &str,
    ) -> Result<SendResult, GatewayError> {
        let params = SendVoiceParams {
            recipient: recipient.to_string(),
            data: STANDARD.encode(audio),
            mime_type: mime_type.to_string(),
            account: self.config.account.clone(),
        };
        self.rpc_call("sendVoice", Some(params)).await
    }

    /// Send a presence indicator (typing / recording / paused).
    pub async fn send_presence(
        &self,
        recipient: &str,
        presence: Presence,
    ) -> Result<(), GatewayError> {
        let params = PresenceParams {
            recipient: recipient.to_string(),
            presence,
            account: self.config.account.clone(),
        };
        // sendPresence returns an empty result on success
        let _: serde_json::Value = self.rpc_call("sendPresence", Some(params)).await?;
        Ok(())
    }

    /// Answer a `keys.request` event with the stored key material.
    pub async fn respond_keys(
        &self,
        request_id: u64,
        keys: HashMap<String, KeyMaterial>,
    ) -> Result<(), GatewayError> {
        let params = RespondKeysParams { request_id, keys };
        let _: serde_json::Value = self.rpc_call("respondKeys", Some(params)).await?;
        Ok(())
    }

    /// Get the account's own JID, once paired.
    pub async fn self_jid(&self) -> Result<String, GatewayError> {
        let resp: JidResponse = self.rpc_call::<(), _>("getSelfJid", None).await?;
        match resp {
            JidResponse::String(s) => Ok(s),
            JidResponse::Object { jid } => Ok(jid),
        }
    }

    /// Log out and invalidate the session on the server side.
    pub async fn logout(&self) -> Result<(), GatewayError> {
        let _: serde_json::Value = self.rpc_call::<(), _>("logout", None).await?;
        Ok(())
    }

    /// Download a media payload by id.
    pub async fn fetch_media(&self, media_id: &str) -> Result<Vec<u8>, GatewayError> {
        let url = self.config.media_url(media_id);
        debug!("Fetching media: {}", url);

        let response = self.http.get(&url).send().await.map_err(GatewayError::Http)?;
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Connection(format!(
                "HTTP {} fetching media {}",
                status, media_id
            )));
        }

        let bytes = response.bytes().await.map_err(GatewayError::Http)?;
        Ok(bytes.to_vec())
    }

    /// Start a background health monitor that periodically checks the daemon.
    pub fn start_health_monitor(&self, interval: Duration) -> JoinHandle<()> {
        let client = self.clone();

        tokio::spawn(async move {
            let mut consecutive_failures = 0u32;

            loop {
                tokio::time::sleep(interval).await;

                match client.health_check().await {
                    Ok(true) => {
                        if consecutive_failures > 0 {
                            info!("Gateway connection restored");
                        }
                        consecutive_failures = 0;
                    }
                    Ok(false) => {
                        consecutive_failures += 1;
                        warn!(
                            "Health check returned not OK (failures: {})",
                            consecutive_failures
                        );
                    }
                    Err(e) => {
                        consecutive_failures += 1;
                        error!(
                            "Health check failed: {} (failures: {})",
                            e, consecutive_failures
                        );
                    }
                }
            }
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Get the underlying HTTP client.
    pub fn http_client(&self) -> &Client {
        &self.http
    }

    /// Make a JSON-RPC call to the daemon.
    async fn rpc_call<P: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: Option<P>,
    ) -> Result<R, GatewayError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let url = self.config.rpc_url();

        let request = RpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id,
        };

        debug!("RPC call: {} (id={})", method, id);

        let response = self
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(GatewayError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Connection(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let rpc_response: RpcResponse<R> = response.json().await.map_err(GatewayError::Http)?;

        if let Some(error) = rpc_response.error {
            return Err(GatewayError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        rpc_response.result.ok_or_else(|| GatewayError::Rpc {
            code: -1,
            message: "No result in response".to_string(),
        })
    }
}

impl std::fmt::Debug for WaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaClient")
            .field("config", &self.config)
            .field("connected", &self.is_connected())
            .finish()
    }
}
