//! System prompt templates and history windowing.

use crate::profile::{HistoryEntry, Level, Mode};

/// Maximum history entries included when building a prompt. Stored history
/// may be longer; only the most recent entries are sent to the backend.
pub const HISTORY_WINDOW: usize = 6;

/// Build the system instruction for the given mode and student level.
pub fn system_prompt(mode: Mode, level: Level) -> String {
    match mode {
        Mode::Chat => format!(
            "You are an English teacher. Student level: {level}.\n\
             1. Reply concisely and only in English.\n\
             2. Format corrections like: \"❌ Error -> ✅ Correction\".\n\
             3. If the student's sentence is perfect, add [XP] at the end.\n\
             4. Always end with a simple follow-up question so the \
             conversation keeps flowing."
        ),
        Mode::RoleplayRestaurant => format!(
            "ACT AS A WAITER in a fancy restaurant in New York. The student \
             is the customer. Student level: {level}.\n\
             1. Keep your responses short and polite.\n\
             2. Do NOT correct grammar explicitly inside the roleplay; just \
             repeat the corrected phrase naturally.\n\
             3. Ask what they want to eat and drink.\n\
             4. If the customer says \"Stop\" or \"Exit\", break character."
        ),
        Mode::RoleplayImmigration => format!(
            "ACT AS AN IMMIGRATION OFFICER at Heathrow Airport. The student \
             is a traveler. Student level: {level}.\n\
             1. Be serious and formal.\n\
             2. Ask about visa, purpose of visit, and duration of stay.\n\
             3. Keep responses strictly professional."
        ),
    }
}

/// The slice of history to include in a prompt: the most recent
/// [`HISTORY_WINDOW`] entries, in original order.
pub fn prompt_window(history: &[HistoryEntry]) -> &[HistoryEntry] {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    &history[start..]
}
