//! Scripted chat backends.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tutor_core::{BackendError, ChatBackend, HistoryEntry};

/// A chat backend that replays a fixed script of replies.
///
/// Replies are consumed in order; once the script is exhausted the last
/// reply repeats. Also records every call for assertions.
#[derive(Debug, Default)]
pub struct ScriptedChat {
    replies: Mutex<Vec<String>>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
    last_history_len: AtomicUsize,
}

impl ScriptedChat {
    /// Create a backend that always produces `reply`.
    pub fn always(reply: impl Into<String>) -> Self {
        Self::script([reply.into()])
    }

    /// Create a backend that replays `replies` in order.
    pub fn script<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Number of chat calls made.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The system prompt of the most recent call.
    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }

    /// History length of the most recent call.
    pub fn last_history_len(&self) -> usize {
        self.last_history_len.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatBackend for ScriptedChat {
    async fn chat(
        &self,
        system_prompt: &str,
        history: &[HistoryEntry],
        _user_text: &str,
    ) -> Result<String, BackendError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(system_prompt.to_string());
        self.last_history_len.store(history.len(), Ordering::SeqCst);

        let replies = self.replies.lock().unwrap();
        match replies.get(call).or_else(|| replies.last()) {
            Some(reply) => Ok(reply.clone()),
            None => Err(BackendError::EmptyResponse),
        }
    }

    fn name(&self) -> &str {
        "ScriptedChat"
    }
}

/// A chat backend that always fails.
#[derive(Debug, Default)]
pub struct FailingChat {
    calls: AtomicUsize,
}

impl FailingChat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of chat calls made.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatBackend for FailingChat {
    async fn chat(
        &self,
        _system_prompt: &str,
        _history: &[HistoryEntry],
        _user_text: &str,
    ) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(BackendError::Request("scripted failure".to_string()))
    }

    fn name(&self) -> &str {
        "FailingChat"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_replies_in_order_then_repeat() {
        let chat = ScriptedChat::script(["one", "two"]);
        assert_eq!(chat.chat("s", &[], "x").await.unwrap(), "one");
        assert_eq!(chat.chat("s", &[], "x").await.unwrap(), "two");
        assert_eq!(chat.chat("s", &[], "x").await.unwrap(), "two");
        assert_eq!(chat.calls(), 3);
    }

    #[tokio::test]
    async fn test_records_prompt_and_history_len() {
        let chat = ScriptedChat::always("ok");
        let history = vec![HistoryEntry::user("a"), HistoryEntry::assistant("b")];
        chat.chat("persona", &history, "x").await.unwrap();
        assert_eq!(chat.last_prompt().as_deref(), Some("persona"));
        assert_eq!(chat.last_history_len(), 2);
    }
}
