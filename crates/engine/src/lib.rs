//! Conversation engine for the WhatsApp tutor bot.
//!
//! An admitted inbound message runs through a fixed pipeline:
//!
//! 1. load-or-create the student profile
//! 2. command interception (`!profile`, `!reset`, mode switches, ...)
//! 3. input resolution (text body, or download + transcribe a voice note)
//! 4. prompt construction and the chat-backend call
//! 5. XP accrual and level promotion
//! 6. persistence of the turn
//! 7. reply dispatch (text, then a best-effort voice note)
//!
//! Admission itself is [`guard::admit`] - a pure predicate that rejects
//! group chats, the bot's own reply echoes, and (in mirror mode) anything
//! not self-addressed, before any state is touched.

pub mod guard;

mod engine;
mod error;
mod store;
mod transport;

pub use engine::{ConversationEngine, EngineConfig, TurnOutcome};
pub use error::EngineError;
pub use store::ProfileStore;
pub use transport::{RecordingTransport, Transport};
