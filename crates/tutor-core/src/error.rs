//! Failure classification shared across the workspace.

/// The closed set of failure kinds the bot distinguishes.
///
/// Error types across the workspace expose `kind()` so callers (and the
/// property tests) can branch on classification instead of log text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Database unreachable, request timeout: skip the turn/record, no
    /// process-level action.
    TransientIo,
    /// Bad cryptographic state: wipe credentials and restart.
    SessionCorruption,
    /// Explicit logout: terminal until the operator re-pairs.
    LoggedOut,
    /// A chat/transcription/speech call failed: turn-local fallback.
    Backend,
}

impl FailureKind {
    /// Short name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TransientIo => "transient-io",
            Self::SessionCorruption => "session-corruption",
            Self::LoggedOut => "logged-out",
            Self::Backend => "backend",
        }
    }
}
