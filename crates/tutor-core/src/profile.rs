//! Student profile state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Proficiency levels, in promotion order.
///
/// Levels only ever move forward; there is no demotion path. A profile
/// reset returns a student to [`Level::Beginner`] by replacing the value,
/// not by walking the ladder backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
    Master,
    Legend,
}

impl Level {
    /// Display/storage name for the level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
            Self::Expert => "Expert",
            Self::Master => "Master",
            Self::Legend => "Legend",
        }
    }

    /// The next level up the ladder, or None at the top.
    pub fn next(&self) -> Option<Level> {
        match self {
            Self::Beginner => Some(Self::Intermediate),
            Self::Intermediate => Some(Self::Advanced),
            Self::Advanced => Some(Self::Expert),
            Self::Expert => Some(Self::Master),
            Self::Master => Some(Self::Legend),
            Self::Legend => None,
        }
    }
}

impl Default for Level {
    fn default() -> Self {
        Self::Beginner
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Beginner" => Ok(Self::Beginner),
            "Intermediate" => Ok(Self::Intermediate),
            "Advanced" => Ok(Self::Advanced),
            "Expert" => Ok(Self::Expert),
            "Master" => Ok(Self::Master),
            "Legend" => Ok(Self::Legend),
            other => Err(format!("unknown level: {}", other)),
        }
    }
}

/// Dialogue modes.
///
/// The mode picks the system persona for the chat backend. Switching modes
/// always clears the stored history so the new persona starts clean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Free chat with the teacher persona (corrections + XP awards).
    Chat,
    /// Scripted roleplay: waiter in a New York restaurant.
    RoleplayRestaurant,
    /// Scripted roleplay: immigration officer at the airport.
    RoleplayImmigration,
}

impl Mode {
    /// Storage name for the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::RoleplayRestaurant => "roleplay_restaurant",
            Self::RoleplayImmigration => "roleplay_immigration",
        }
    }

    /// Whether this mode is a fixed-persona roleplay.
    pub fn is_roleplay(&self) -> bool {
        !matches!(self, Self::Chat)
    }

    /// Human-readable label for profile read-backs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Chat => "Free chat",
            Self::RoleplayRestaurant => "Restaurant roleplay",
            Self::RoleplayImmigration => "Immigration roleplay",
        }
    }
}

impl Default for Mode {
    fn default() -> Self {
        Self::Chat
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chat" => Ok(Self::Chat),
            "roleplay_restaurant" => Ok(Self::RoleplayRestaurant),
            "roleplay_immigration" => Ok(Self::RoleplayImmigration),
            other => Err(format!("unknown mode: {}", other)),
        }
    }
}

/// Who produced a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single message in a student's conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

impl HistoryEntry {
    /// Create a user entry.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant entry.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Per-student conversational state.
///
/// One profile exists per remote JID. Profiles are created lazily on the
/// first inbound message and mutated once per processed turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    /// Transport address (WhatsApp JID). Unique and immutable.
    pub jid: String,
    /// Push name, if the transport reported one.
    pub display_name: Option<String>,
    /// Current level. Monotonically non-decreasing.
    pub level: Level,
    /// Accumulated XP. Monotone within a session; reset by command.
    pub xp: u32,
    /// Current dialogue mode.
    pub mode: Mode,
    /// Full stored history. Prompt construction windows this separately.
    pub history: Vec<HistoryEntry>,
}

impl StudentProfile {
    /// Create a fresh profile with default progression state.
    pub fn new(jid: impl Into<String>) -> Self {
        Self {
            jid: jid.into(),
            display_name: None,
            level: Level::default(),
            xp: 0,
            mode: Mode::default(),
            history: Vec::new(),
        }
    }

    /// Create a fresh profile carrying the sender's push name.
    pub fn with_name(jid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            display_name: Some(name.into()),
            ..Self::new(jid)
        }
    }

    /// Switch dialogue mode. Always clears the history, even when switching
    /// to the mode already active.
    pub fn switch_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.history.clear();
    }

    /// Reset progression and history to defaults. The JID and display name
    /// are kept.
    pub fn reset(&mut self) {
        self.level = Level::default();
        self.xp = 0;
        self.history.clear();
    }

    /// Append one completed turn (user input + assistant reply).
    pub fn record_turn(&mut self, user_text: &str, assistant_text: &str) {
        self.history.push(HistoryEntry::user(user_text));
        self.history.push(HistoryEntry::assistant(assistant_text));
    }

    /// Name to address the student by in replies.
    pub fn salutation(&self) -> &str {
        self.display_name.as_deref().unwrap_or("student")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_order_is_fixed() {
        let mut level = Level::Beginner;
        let mut seen = vec![level];
        while let Some(next) = level.next() {
            assert!(next > level, "ladder must ascend");
            seen.push(next);
            level = next;
        }
        assert_eq!(
            seen,
            vec![
                Level::Beginner,
                Level::Intermediate,
                Level::Advanced,
                Level::Expert,
                Level::Master,
                Level::Legend,
            ]
        );
    }

    #[test]
    fn test_level_round_trips_through_str() {
        for level in [
            Level::Beginner,
            Level::Intermediate,
            Level::Advanced,
            Level::Expert,
            Level::Master,
            Level::Legend,
        ] {
            assert_eq!(level.as_str().parse::<Level>().unwrap(), level);
        }
    }

    #[test]
    fn test_mode_round_trips_through_str() {
        for mode in [
            Mode::Chat,
            Mode::RoleplayRestaurant,
            Mode::RoleplayImmigration,
        ] {
            assert_eq!(mode.as_str().parse::<Mode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_switch_mode_clears_history() {
        let mut profile = StudentProfile::new("a@s.whatsapp.net");
        profile.record_turn("hi", "hello");
        profile.record_turn("how are you", "fine");
        assert_eq!(profile.history.len(), 4);

        profile.switch_mode(Mode::RoleplayImmigration);
        assert!(profile.history.is_empty());
        assert_eq!(profile.mode, Mode::RoleplayImmigration);

        // Switching to the already-active mode clears as well.
        profile.record_turn("hi", "hello");
        profile.switch_mode(Mode::RoleplayImmigration);
        assert!(profile.history.is_empty());
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut profile = StudentProfile::with_name("a@s.whatsapp.net", "Ana");
        profile.xp = 480;
        profile.level = Level::Advanced;
        profile.record_turn("hi", "hello");

        profile.reset();
        assert_eq!(profile.xp, 0);
        assert_eq!(profile.level, Level::Beginner);
        assert!(profile.history.is_empty());
        assert_eq!(profile.display_name.as_deref(), Some("Ana"));
    }

    #[test]
    fn test_history_entry_serde_roles_are_lowercase() {
        let entry = HistoryEntry::assistant("hello");
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"assistant\""));
        let back: HistoryEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
