//! Wire types for the gateway daemon protocol.

mod event;
mod send;

pub use event::{AudioRef, ConnectionClose, GatewayEvent, KeysRequest, MessageEvent};
pub use send::{Presence, SendParams, SendResult, SendVoiceParams};
