//! Canned backend implementations.
//!
//! These stand in for the OpenAI backends in tests and examples: replies
//! are scripted, transcripts are fixed, and every implementation counts
//! its calls so tests can assert which backends a turn actually reached.

mod chat;
mod speech;

pub use chat::{FailingChat, ScriptedChat};
pub use speech::{FailingSynthesizer, FixedSynthesizer, FixedTranscriber};
