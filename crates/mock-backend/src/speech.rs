//! Fixed transcription and synthesis backends.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tutor_core::{BackendError, SpeechToText, TextToSpeech};

/// A transcriber that always hears the same text.
#[derive(Debug, Default)]
pub struct FixedTranscriber {
    text: String,
    calls: AtomicUsize,
}

impl FixedTranscriber {
    /// Create a transcriber producing `text` for any audio.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            calls: AtomicUsize::new(0),
        }
    }

    /// A transcriber that hears nothing usable.
    pub fn silent() -> Self {
        Self::new("")
    }

    /// Number of transcription calls made.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechToText for FixedTranscriber {
    async fn transcribe(&self, _audio: &[u8], _mime_type: &str) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.clone())
    }
}

/// A synthesizer returning a fixed payload.
#[derive(Debug)]
pub struct FixedSynthesizer {
    payload: Vec<u8>,
    calls: AtomicUsize,
}

impl FixedSynthesizer {
    pub fn new(payload: Vec<u8>) -> Self {
        Self {
            payload,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of synthesis calls made.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for FixedSynthesizer {
    fn default() -> Self {
        Self::new(vec![0u8; 16])
    }
}

#[async_trait]
impl TextToSpeech for FixedSynthesizer {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.payload.clone())
    }

    fn mime_type(&self) -> &str {
        "audio/mpeg"
    }
}

/// A synthesizer that always fails. Voice failures must never fail a turn.
#[derive(Debug, Default)]
pub struct FailingSynthesizer;

#[async_trait]
impl TextToSpeech for FailingSynthesizer {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>, BackendError> {
        Err(BackendError::Request("scripted failure".to_string()))
    }

    fn mime_type(&self) -> &str {
        "audio/mpeg"
    }
}
