//! Loop guard: admission control for inbound messages.
//!
//! A pure predicate with no side effects - it never touches the database.
//! Its main job is making mirror mode safe: when the account messages
//! itself, sent and received streams are not separated by the transport,
//! so the bot's own output comes back as input and must be filtered out
//! before it re-enters the pipeline.

use tutor_core::is_own_reply;
use wa_gateway::MessageEvent;

/// Why an event was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Group conversations are not processed.
    GroupChat,
    /// The text carries the bot's own reply signature.
    OwnReply,
    /// Own-device echo outside mirror mode.
    OwnMessage,
    /// Mirror mode requires sender == recipient.
    NotSelfAddressed,
}

impl RejectReason {
    /// Short description for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GroupChat => "group chat",
            Self::OwnReply => "own reply echo",
            Self::OwnMessage => "own message outside mirror mode",
            Self::NotSelfAddressed => "not self-addressed in mirror mode",
        }
    }
}

/// Admission decision for one inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Rejected(RejectReason),
}

/// Decide whether an inbound event is eligible for processing.
pub fn admit(event: &MessageEvent, mirror_mode: bool) -> Admission {
    if event.is_group {
        return Admission::Rejected(RejectReason::GroupChat);
    }

    if event.text.as_deref().is_some_and(is_own_reply) {
        return Admission::Rejected(RejectReason::OwnReply);
    }

    if mirror_mode {
        if event.sender != event.recipient {
            return Admission::Rejected(RejectReason::NotSelfAddressed);
        }
    } else if event.from_self {
        return Admission::Rejected(RejectReason::OwnMessage);
    }

    Admission::Admitted
}
