//! WhatsApp gateway daemon client library.
//!
//! The gateway daemon owns the WhatsApp wire protocol (Noise handshake,
//! multi-device pairing, media encryption). This crate is the Rust client
//! for it:
//!
//! - Sending text, voice notes, and presence updates
//! - Receiving messages and connection lifecycle events via Server-Sent
//!   Events (SSE)
//! - Supplying durable session credentials through the [`SessionStore`]
//!   trait - the daemon itself keeps no state at rest
//!
//! # Example
//!
//! ```no_run
//! use wa_gateway::{GatewayConfig, WaClient};
//!
//! # async fn example() -> Result<(), wa_gateway::GatewayError> {
//! let config = GatewayConfig::default();
//! let client = WaClient::connect(config).await?;
//!
//! let result = client.send_text("5511999990000@s.whatsapp.net", "Hello!").await?;
//! println!("Sent message {}", result.message_id);
//!
//! use futures::StreamExt;
//! let mut events = wa_gateway::subscribe(&client);
//! while let Some(event) = events.next().await {
//!     println!("{:?}", event);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod session;
pub mod sse;
pub mod types;

pub use client::WaClient;
pub use config::GatewayConfig;
pub use error::GatewayError;
pub use session::{
    AppStateSyncKeyData, AppStateSyncKeyFingerprint, DeviceIdentity, KeyCategory, KeyMaterial,
    KeyMutation, KeyPair, SessionCreds, SessionStore, SessionStoreError, SignedPreKey,
    CREDS_RECORD_ID,
};
pub use sse::{subscribe, EventStream};
pub use types::*;

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
