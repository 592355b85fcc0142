//! Control commands recognized in message text.

use crate::profile::Mode;

/// Operator-visible control commands. A recognized command short-circuits
/// the conversation pipeline; no backend call is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Greeting and usage hint.
    Start,
    /// Profile read-back (name, level, XP).
    Profile,
    /// Clear history and reset progression.
    Reset,
    /// Liveness probe.
    Ping,
    /// Switch dialogue mode (clears history).
    SwitchMode(Mode),
}

/// Parse a control command from message text.
///
/// Commands are a single token prefixed with `!` or `/`, case-insensitive.
/// Anything else is regular conversation input.
pub fn parse(text: &str) -> Option<Command> {
    let trimmed = text.trim();
    let token = trimmed
        .strip_prefix('!')
        .or_else(|| trimmed.strip_prefix('/'))?;

    match token.to_ascii_lowercase().as_str() {
        "start" => Some(Command::Start),
        "profile" | "perfil" => Some(Command::Profile),
        "reset" => Some(Command::Reset),
        "ping" => Some(Command::Ping),
        "chat" => Some(Command::SwitchMode(Mode::Chat)),
        "restaurant" => Some(Command::SwitchMode(Mode::RoleplayRestaurant)),
        "immigration" => Some(Command::SwitchMode(Mode::RoleplayImmigration)),
        _ => None,
    }
}
