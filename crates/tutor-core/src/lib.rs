//! Core domain logic for the WhatsApp tutor bot.
//!
//! This crate holds everything about a tutoring conversation that does not
//! touch the network or the database:
//!
//! - [`StudentProfile`] - per-student state (level, XP, mode, history)
//! - [`Level`] / [`Mode`] - the progression ladder and dialogue modes
//! - [`Command`] - operator-visible control commands parsed from message text
//! - prompt construction and history windowing
//! - reply post-processing (completion marker, speech-safe text)
//! - [`ChatBackend`] / [`SpeechToText`] / [`TextToSpeech`] - the traits the
//!   conversation engine delegates to
//!
//! # Example
//!
//! ```rust
//! use tutor_core::{Level, Mode, StudentProfile};
//!
//! let mut profile = StudentProfile::new("5511999990000@s.whatsapp.net");
//! assert_eq!(profile.level, Level::Beginner);
//!
//! profile.switch_mode(Mode::RoleplayRestaurant);
//! assert!(profile.history.is_empty());
//! ```

mod backend;
mod command;
mod error;
mod profile;
mod progress;
mod prompt;
mod reply;

pub use backend::{BackendError, ChatBackend, SpeechToText, TextToSpeech};
pub use command::{parse as parse_command, Command};
pub use error::FailureKind;
pub use profile::{HistoryEntry, Level, Mode, Role, StudentProfile};
pub use progress::{promotion_for, TurnProgress, XP_EFFORT, XP_PERFECT_TURN};
pub use prompt::{prompt_window, system_prompt, HISTORY_WINDOW};
pub use reply::{
    extract_completion, is_own_reply, speech_text, strip_reply_marker, COMPLETION_MARKER,
    REPLY_MARKER,
};

// Re-export async_trait for backend implementors.
pub use async_trait::async_trait;

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
