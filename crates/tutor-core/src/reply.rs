//! Reply post-processing: completion marker, self-signature, speech text.

use regex::Regex;

/// Sentinel the chat backend appends when the student's sentence was
/// error-free. Never shown to the student.
pub const COMPLETION_MARKER: &str = "[XP]";

/// Visible note substituted for the completion marker.
const XP_NOTE: &str = "🌟 (+10 XP)";

/// Prefix the bot puts on its own outbound replies so they can be
/// recognized if the transport feeds them back as inbound messages
/// (mirror mode shares one account for both directions).
pub const REPLY_MARKER: &str = "🤖 ";

/// Strip the completion marker from a backend reply.
///
/// Returns the visible text and whether the marker was present. When
/// `reward` is set the marker becomes the visible XP note; otherwise it
/// is removed outright (roleplay modes strip stray markers without
/// pretending to award anything).
pub fn extract_completion(reply: &str, reward: bool) -> (String, bool) {
    if !reply.contains(COMPLETION_MARKER) {
        return (reply.to_string(), false);
    }

    let visible = if reward {
        reply
            .replacen(COMPLETION_MARKER, XP_NOTE, 1)
            .replace(COMPLETION_MARKER, "")
    } else {
        reply.replace(COMPLETION_MARKER, "").trim_end().to_string()
    };
    (visible, true)
}

/// Whether inbound text carries the bot's own reply signature.
pub fn is_own_reply(text: &str) -> bool {
    text.trim_start().starts_with(REPLY_MARKER.trim_end())
}

/// Remove the reply signature from a piece of text, if present.
pub fn strip_reply_marker(text: &str) -> &str {
    let trimmed = text.trim_start();
    trimmed
        .strip_prefix(REPLY_MARKER)
        .or_else(|| trimmed.strip_prefix(REPLY_MARKER.trim_end()))
        .map(str::trim_start)
        .unwrap_or(text)
}

/// Derive the speech-safe version of a reply for voice synthesis.
///
/// Correction lines, the XP/level-up notes, and structural markup read
/// terribly out loud, so they are dropped. Returns None when fewer than a
/// couple of characters survive - in that case no voice note is sent.
pub fn speech_text(reply: &str) -> Option<String> {
    let correction_line = Regex::new(r"(?m)^.*[❌✅].*$").expect("valid regex");
    let correction_block = Regex::new(r"(?s)Correction:.*?Tip:.*?(\n|$)").expect("valid regex");

    let mut text = strip_reply_marker(reply).to_string();
    text = correction_block.replace_all(&text, "").into_owned();
    text = correction_line.replace_all(&text, "").into_owned();
    text = text.replace(XP_NOTE, "");
    text = text
        .lines()
        .filter(|line| !line.contains("Level Up!"))
        .collect::<Vec<_>>()
        .join("\n");
    text.retain(|c| !matches!(c, '*' | '[' | ']' | '_' | '`' | '#' | '🌟' | '🎉'));

    let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.chars().count() < 2 {
        None
    } else {
        Some(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_completion_strips_marker() {
        let (visible, perfect) = extract_completion("Great sentence! [XP]", true);
        assert!(perfect);
        assert!(!visible.contains(COMPLETION_MARKER));
        assert!(visible.contains("+10 XP"));
    }

    #[test]
    fn test_extract_completion_without_marker() {
        let (visible, perfect) = extract_completion("Almost right.", true);
        assert!(!perfect);
        assert_eq!(visible, "Almost right.");
    }

    #[test]
    fn test_extract_completion_without_reward_drops_marker_silently() {
        let (visible, perfect) = extract_completion("Right away, sir. [XP]", false);
        assert!(perfect);
        assert_eq!(visible, "Right away, sir.");
    }

    #[test]
    fn test_own_reply_detection() {
        assert!(is_own_reply("🤖 Hello!"));
        assert!(is_own_reply("  🤖 Hello!"));
        assert!(!is_own_reply("Hello 🤖"));
    }

    #[test]
    fn test_strip_reply_marker() {
        assert_eq!(strip_reply_marker("🤖 Hello!"), "Hello!");
        assert_eq!(strip_reply_marker("Hello!"), "Hello!");
    }

    #[test]
    fn test_speech_text_drops_corrections() {
        let reply = "❌ I has a dog -> ✅ I have a dog\nNice try! What is your dog's name?";
        let speech = speech_text(reply).unwrap();
        assert!(!speech.contains('❌'));
        assert!(!speech.contains("I has"));
        assert!(speech.contains("Nice try!"));
    }

    #[test]
    fn test_speech_text_drops_markup_and_notes() {
        let reply = "🤖 **Well done!** 🌟 (+10 XP)\n\n🎉 Level Up! You are now Intermediate!";
        let speech = speech_text(reply).unwrap();
        assert_eq!(speech, "Well done!");
    }

    #[test]
    fn test_speech_text_trivial_content_is_none() {
        assert_eq!(speech_text("❌ a -> ✅ b"), None);
        assert_eq!(speech_text("*"), None);
        assert_eq!(speech_text(""), None);
    }
}
