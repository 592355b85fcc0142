//! OpenAI backend implementations for the tutor bot.
//!
//! Implements the three backend traits from `tutor-core` against the
//! OpenAI API: chat completions, Whisper transcription, and speech
//! synthesis. All requests share one HTTP client with a bounded timeout;
//! a timeout surfaces as a generic backend failure.
//!
//! # Example
//!
//! ```no_run
//! use openai_backend::{OpenAiBackend, OpenAiConfig};
//! use tutor_core::ChatBackend;
//!
//! # async fn example() -> Result<(), tutor_core::BackendError> {
//! let backend = OpenAiBackend::new(OpenAiConfig::new("sk-..."))?;
//! let reply = backend.chat("You are a teacher.", &[], "Hello!").await?;
//! println!("{}", reply);
//! # Ok(())
//! # }
//! ```

mod api_types;
mod backend;
mod config;

pub use backend::OpenAiBackend;
pub use config::OpenAiConfig;

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
