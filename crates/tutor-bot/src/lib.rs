//! WhatsApp tutor bot: connection supervision and wiring.
//!
//! The [`ConnectionSupervisor`] owns the gateway client lifecycle - it
//! starts the session, watches connection-state events, persists every
//! credential rotation, and decides between reconnecting, wiping the
//! session for a supervised restart, and halting after a logout. Message
//! events reach the conversation engine only while the connection is open.

pub mod config;
pub mod supervisor;
pub mod transport;

pub use config::BotConfig;
pub use supervisor::{
    apply_close_policy, classify_close, CloseAction, ConnectionState, ConnectionSupervisor,
    SupervisorExit,
};
pub use transport::WaTransport;
