//! The conversation pipeline.

use std::sync::Arc;

use tracing::{debug, info, warn};
use tutor_core::{
    extract_completion, prompt_window, speech_text, system_prompt, ChatBackend, Command, Mode,
    SpeechToText, StudentProfile, TextToSpeech, TurnProgress, REPLY_MARKER, XP_EFFORT,
    XP_PERFECT_TURN,
};
use wa_gateway::{MessageEvent, Presence};

use crate::error::EngineError;
use crate::guard::{self, Admission};
use crate::store::ProfileStore;
use crate::transport::Transport;

/// Reply sent when the chat backend fails.
const FALLBACK_REPLY: &str = "Sorry, I am having trouble thinking right now.";

/// Reply sent when a voice note yields no usable transcript.
const NOTHING_HEARD_REPLY: &str = "👂 I couldn't make out any words. Could you try again?";

/// Reply sent when transcription itself fails.
const TRANSCRIPTION_FAILED_REPLY: &str = "❌ Sorry, I couldn't hear you properly.";

/// Engine configuration.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Mirror mode: the account talks to itself as a private interface.
    /// Requires self-addressed messages and signs every outbound reply
    /// with the reply marker so echoes can be filtered.
    pub mirror_mode: bool,
}

/// Result of processing a single inbound event.
#[derive(Debug)]
pub enum TurnOutcome {
    /// A reply was sent.
    Replied {
        recipient: String,
        text: String,
        voice_sent: bool,
    },
    /// The event was not processed (guard rejection, empty transcript, ...).
    Skipped { reason: String },
    /// Processing failed; any partial sends were best-effort.
    Failed(EngineError),
}

/// Per-user conversation processing.
///
/// Events are handed in one at a time by the supervisor's event pump, so
/// turns for the same student are naturally serialized and the profile
/// read-modify-write needs no locking.
pub struct ConversationEngine {
    store: ProfileStore,
    transport: Arc<dyn Transport>,
    chat: Arc<dyn ChatBackend>,
    stt: Arc<dyn SpeechToText>,
    tts: Arc<dyn TextToSpeech>,
    config: EngineConfig,
}

impl ConversationEngine {
    /// Create a new engine.
    pub fn new(
        store: ProfileStore,
        transport: Arc<dyn Transport>,
        chat: Arc<dyn ChatBackend>,
        stt: Arc<dyn SpeechToText>,
        tts: Arc<dyn TextToSpeech>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            transport,
            chat,
            stt,
            tts,
            config,
        }
    }

    /// Process one inbound event: admission, then the turn pipeline.
    ///
    /// Never returns an error; failures are folded into the outcome so the
    /// event pump keeps running.
    pub async fn process_event(&self, event: &MessageEvent) -> TurnOutcome {
        match guard::admit(event, self.config.mirror_mode) {
            Admission::Rejected(reason) => {
                debug!("Skipping message from {}: {}", event.sender, reason.as_str());
                return TurnOutcome::Skipped {
                    reason: reason.as_str().to_string(),
                };
            }
            Admission::Admitted => {}
        }

        match self.run_turn(event).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    kind = e.kind().as_str(),
                    "Turn failed for {}: {}", event.sender, e
                );
                TurnOutcome::Failed(e)
            }
        }
    }

    /// The turn pipeline for an admitted event.
    async fn run_turn(&self, event: &MessageEvent) -> Result<TurnOutcome, EngineError> {
        let jid = event.sender.as_str();
        let mut profile = self
            .store
            .load_or_create(jid, event.push_name.as_deref())
            .await?;

        // Command interception: no backend calls.
        if let Some(command) = event.text.as_deref().and_then(tutor_core::parse_command) {
            return self.handle_command(&mut profile, command).await;
        }

        // Input resolution: literal text, or download + transcribe audio.
        let input = match self.resolve_input(event).await? {
            Some(input) => input,
            None => {
                return Ok(TurnOutcome::Skipped {
                    reason: "no usable input".to_string(),
                })
            }
        };

        let _ = self
            .transport
            .set_presence(jid, Presence::Composing)
            .await;

        // Chat backend call; failure yields one fallback reply and aborts
        // the turn without mutating xp/history.
        let system = system_prompt(profile.mode, profile.level);
        let window = prompt_window(&profile.history);
        let reply = match self.chat.chat(&system, window, &input).await {
            Ok(reply) => reply,
            Err(e) => {
                let _ = self.send_reply(jid, FALLBACK_REPLY).await;
                return Err(e.into());
            }
        };

        // Gamification. The marker is stripped in every mode; XP accrues
        // only in free chat.
        let (mut visible, perfect) = extract_completion(&reply, profile.mode == Mode::Chat);
        if profile.mode == Mode::Chat {
            let earned = if perfect { XP_PERFECT_TURN } else { XP_EFFORT };
            let progress = TurnProgress::apply(&mut profile, earned);
            if let Some(level) = progress.promoted {
                info!("{} promoted to {}", jid, level);
                visible.push_str(&format!(
                    "\n\n🎉 **Level Up!** You are now {}!",
                    level
                ));
            }
        }

        // Persist the turn, then dispatch.
        profile.record_turn(&input, &visible);
        self.store.save(&profile).await?;

        let sent = self.send_reply(jid, &visible).await?;
        let voice_sent = self.send_voice_reply(jid, &visible).await;

        Ok(TurnOutcome::Replied {
            recipient: jid.to_string(),
            text: sent,
            voice_sent,
        })
    }

    /// Resolve the effective user input for a turn.
    async fn resolve_input(&self, event: &MessageEvent) -> Result<Option<String>, EngineError> {
        let jid = event.sender.as_str();

        let Some(audio) = &event.audio else {
            return Ok(event
                .text
                .as_deref()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_string));
        };

        let bytes = self.transport.fetch_media(&audio.media_id).await?;
        let heard = match self.stt.transcribe(&bytes, &audio.mime_type).await {
            Ok(heard) => heard,
            Err(e) => {
                let _ = self.send_reply(jid, TRANSCRIPTION_FAILED_REPLY).await;
                return Err(e.into());
            }
        };

        let heard = heard.trim().to_string();
        if heard.is_empty() {
            // Surface the (empty) read-back, then abort the turn: no chat
            // call, no profile mutation.
            let _ = self.send_reply(jid, NOTHING_HEARD_REPLY).await;
            return Ok(None);
        }

        let _ = self
            .send_reply(jid, &format!("👂 Heard: \"{}\"", heard))
            .await;
        Ok(Some(heard))
    }

    /// Handle a control command. Reads or resets profile fields and
    /// replies immediately; no backend call.
    async fn handle_command(
        &self,
        profile: &mut StudentProfile,
        command: Command,
    ) -> Result<TurnOutcome, EngineError> {
        let jid = profile.jid.clone();

        let reply = match command {
            Command::Start => format!(
                "Hello {}! 👋\nI'm your English teacher.\nSend me a voice message or text to start practicing!",
                profile.salutation()
            ),
            Command::Profile => format!(
                "📊 *Profile*\nName: {}\nLevel: {}\nXP: {} ✨\nMode: {}",
                profile.salutation(),
                profile.level,
                profile.xp,
                profile.mode.label()
            ),
            Command::Reset => {
                profile.reset();
                self.store.save(profile).await?;
                "🧠 Memory erased. Let's start fresh!".to_string()
            }
            Command::Ping => "🏓 pong".to_string(),
            Command::SwitchMode(mode) => {
                profile.switch_mode(mode);
                self.store.save(profile).await?;
                match mode {
                    Mode::Chat => "💬 Back to free chat. Send me a sentence!".to_string(),
                    Mode::RoleplayRestaurant => {
                        "🍽️ Roleplay started: you walk into a fancy New York restaurant."
                            .to_string()
                    }
                    Mode::RoleplayImmigration => {
                        "🛂 Roleplay started: you just landed at Heathrow. The officer looks up."
                            .to_string()
                    }
                }
            }
        };

        let sent = self.send_reply(&jid, &reply).await?;
        Ok(TurnOutcome::Replied {
            recipient: jid,
            text: sent,
            voice_sent: false,
        })
    }

    /// Send a text reply, signing it with the reply marker in mirror mode
    /// so the loop guard can recognize the echo.
    async fn send_reply(&self, jid: &str, text: &str) -> Result<String, EngineError> {
        let outbound = if self.config.mirror_mode {
            format!("{}{}", REPLY_MARKER, text)
        } else {
            text.to_string()
        };
        self.transport.send_text(jid, &outbound).await?;
        Ok(outbound)
    }

    /// Best-effort voice reply. Failures are logged and swallowed - the
    /// text reply already delivered is the success condition.
    async fn send_voice_reply(&self, jid: &str, visible: &str) -> bool {
        let Some(speech) = speech_text(visible) else {
            return false;
        };

        let _ = self
            .transport
            .set_presence(jid, Presence::Recording)
            .await;

        let audio = match self.tts.synthesize(&speech).await {
            Ok(audio) => audio,
            Err(e) => {
                warn!("Voice synthesis failed for {}: {}", jid, e);
                return false;
            }
        };

        match self
            .transport
            .send_voice(jid, &audio, self.tts.mime_type())
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!("Voice send failed for {}: {}", jid, e);
                false
            }
        }
    }
}
