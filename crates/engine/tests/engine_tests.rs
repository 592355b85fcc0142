//! Scenario tests for the conversation pipeline.
//!
//! These drive the engine with mock backends, a recording transport, and
//! an in-memory database - no daemon or network involved.

use std::sync::Arc;

use database::Database;
use engine::{ConversationEngine, EngineConfig, ProfileStore, RecordingTransport, TurnOutcome};
use mock_backend::{
    FailingChat, FailingSynthesizer, FixedSynthesizer, FixedTranscriber, ScriptedChat,
};
use tutor_core::{ChatBackend, FailureKind, Level, Mode, SpeechToText, StudentProfile};
use wa_gateway::{AudioRef, MessageEvent};

const STUDENT: &str = "5511888880000@s.whatsapp.net";
const ME: &str = "5511999990000@s.whatsapp.net";

fn text_event(sender: &str, text: &str) -> MessageEvent {
    MessageEvent {
        sender: sender.to_string(),
        recipient: ME.to_string(),
        push_name: Some("Ana".to_string()),
        is_group: false,
        from_self: false,
        text: Some(text.to_string()),
        audio: None,
        timestamp: 1_700_000_000_000,
    }
}

fn voice_event(sender: &str) -> MessageEvent {
    MessageEvent {
        text: None,
        audio: Some(AudioRef {
            media_id: "m1".to_string(),
            mime_type: "audio/ogg; codecs=opus".to_string(),
        }),
        ..text_event(sender, "")
    }
}

struct Harness {
    store: ProfileStore,
    transport: Arc<RecordingTransport>,
    chat: Arc<ScriptedChat>,
    stt: Arc<FixedTranscriber>,
    engine: ConversationEngine,
}

impl Harness {
    async fn new(chat: ScriptedChat, stt: FixedTranscriber, config: EngineConfig) -> Self {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();

        let store = ProfileStore::new(db);
        let transport = Arc::new(RecordingTransport::with_media(vec![1u8; 64]));
        let chat = Arc::new(chat);
        let stt = Arc::new(stt);

        let engine = ConversationEngine::new(
            store.clone(),
            transport.clone(),
            chat.clone(),
            stt.clone(),
            Arc::new(FixedSynthesizer::default()),
            config,
        );

        Self {
            store,
            transport,
            chat,
            stt,
            engine,
        }
    }

    async fn profile(&self, jid: &str) -> StudentProfile {
        self.store.load_or_create(jid, None).await.unwrap()
    }

    async fn seed(&self, profile: &StudentProfile) {
        self.store.save(profile).await.unwrap();
    }
}

#[tokio::test]
async fn test_new_user_hello_creates_profile_and_awards_marker_xp() {
    let h = Harness::new(
        ScriptedChat::always("Perfect sentence! [XP]"),
        FixedTranscriber::silent(),
        EngineConfig::default(),
    )
    .await;

    let outcome = h.engine.process_event(&text_event(STUDENT, "Hello")).await;
    let TurnOutcome::Replied { text, .. } = outcome else {
        panic!("expected a reply, got {:?}", outcome);
    };

    assert!(!text.contains("[XP]"), "marker must be stripped: {}", text);
    assert!(text.contains("+10 XP"));

    let profile = h.profile(STUDENT).await;
    assert_eq!(profile.xp, 10);
    assert_eq!(profile.level, Level::Beginner);
    assert_eq!(profile.history.len(), 2);
    assert_eq!(profile.history[0].content, "Hello");
    assert_eq!(profile.display_name.as_deref(), Some("Ana"));
}

#[tokio::test]
async fn test_effort_xp_without_marker() {
    let h = Harness::new(
        ScriptedChat::always("Almost! ❌ I has -> ✅ I have. What else?"),
        FixedTranscriber::silent(),
        EngineConfig::default(),
    )
    .await;

    h.engine.process_event(&text_event(STUDENT, "I has a dog")).await;
    assert_eq!(h.profile(STUDENT).await.xp, 1);
}

#[tokio::test]
async fn test_threshold_crossing_promotes_once_with_single_notice() {
    let h = Harness::new(
        ScriptedChat::always("Flawless! [XP]"),
        FixedTranscriber::silent(),
        EngineConfig::default(),
    )
    .await;

    let mut profile = StudentProfile::with_name(STUDENT, "Ana");
    profile.xp = 95;
    h.seed(&profile).await;

    let outcome = h.engine.process_event(&text_event(STUDENT, "Hello")).await;
    let TurnOutcome::Replied { text, .. } = outcome else {
        panic!("expected a reply, got {:?}", outcome);
    };

    assert_eq!(text.matches("Level Up!").count(), 1);
    assert!(text.contains("Intermediate"));

    let profile = h.profile(STUDENT).await;
    assert_eq!(profile.xp, 105);
    assert_eq!(profile.level, Level::Intermediate);
}

#[tokio::test]
async fn test_reset_command_restores_defaults() {
    let h = Harness::new(
        ScriptedChat::always("unused"),
        FixedTranscriber::silent(),
        EngineConfig::default(),
    )
    .await;

    let mut profile = StudentProfile::with_name(STUDENT, "Ana");
    profile.xp = 480;
    profile.level = Level::Advanced;
    profile.record_turn("hi", "hello");
    h.seed(&profile).await;

    h.engine.process_event(&text_event(STUDENT, "!reset")).await;

    let profile = h.profile(STUDENT).await;
    assert_eq!(profile.xp, 0);
    assert_eq!(profile.level, Level::Beginner);
    assert!(profile.history.is_empty());
    assert_eq!(h.chat.calls(), 0, "commands must not reach the backend");
}

#[tokio::test]
async fn test_mode_switch_clears_history_and_swaps_persona() {
    let h = Harness::new(
        ScriptedChat::always("Welcome! Table for one?"),
        FixedTranscriber::silent(),
        EngineConfig::default(),
    )
    .await;

    let mut profile = StudentProfile::with_name(STUDENT, "Ana");
    profile.record_turn("hi", "hello");
    profile.record_turn("how are you", "fine");
    h.seed(&profile).await;

    h.engine
        .process_event(&text_event(STUDENT, "!restaurant"))
        .await;

    let profile = h.profile(STUDENT).await;
    assert_eq!(profile.mode, Mode::RoleplayRestaurant);
    assert!(profile.history.is_empty());

    // The next turn uses the waiter persona and awards no XP.
    h.engine
        .process_event(&text_event(STUDENT, "A table please"))
        .await;
    assert!(h.chat.last_prompt().unwrap().contains("WAITER"));
    assert_eq!(h.profile(STUDENT).await.xp, 0);
}

#[tokio::test]
async fn test_roleplay_still_strips_a_stray_marker() {
    let h = Harness::new(
        ScriptedChat::always("Right away, sir. [XP]"),
        FixedTranscriber::silent(),
        EngineConfig::default(),
    )
    .await;

    let mut profile = StudentProfile::with_name(STUDENT, "Ana");
    profile.switch_mode(Mode::RoleplayImmigration);
    h.seed(&profile).await;

    let outcome = h.engine.process_event(&text_event(STUDENT, "Here it is")).await;
    let TurnOutcome::Replied { text, .. } = outcome else {
        panic!("expected a reply, got {:?}", outcome);
    };
    assert!(!text.contains("[XP]"));
    assert!(!text.contains("+10 XP"), "no award note in roleplay: {}", text);
    assert_eq!(h.profile(STUDENT).await.xp, 0);
}

#[tokio::test]
async fn test_prompt_window_is_bounded() {
    let h = Harness::new(
        ScriptedChat::always("ok"),
        FixedTranscriber::silent(),
        EngineConfig::default(),
    )
    .await;

    let mut profile = StudentProfile::with_name(STUDENT, "Ana");
    for i in 0..8 {
        profile.record_turn(&format!("q{}", i), &format!("a{}", i));
    }
    assert_eq!(profile.history.len(), 16);
    h.seed(&profile).await;

    h.engine.process_event(&text_event(STUDENT, "Hello")).await;
    assert_eq!(h.chat.last_history_len(), 6);

    // Stored history keeps growing past the window.
    assert_eq!(h.profile(STUDENT).await.history.len(), 18);
}

#[tokio::test]
async fn test_voice_turn_sends_read_back_then_reply() {
    let h = Harness::new(
        ScriptedChat::always("Nice! What is your dog's name?"),
        FixedTranscriber::new("I have a dog"),
        EngineConfig::default(),
    )
    .await;

    let outcome = h.engine.process_event(&voice_event(STUDENT)).await;
    assert!(matches!(outcome, TurnOutcome::Replied { .. }));
    assert_eq!(h.stt.calls(), 1);

    let texts = h.transport.sent_texts();
    assert!(texts[0].1.contains("👂 Heard: \"I have a dog\""));
    assert!(texts[1].1.contains("What is your dog's name?"));

    let profile = h.profile(STUDENT).await;
    assert_eq!(profile.history[0].content, "I have a dog");
}

#[tokio::test]
async fn test_empty_transcription_aborts_before_the_chat_call() {
    let h = Harness::new(
        ScriptedChat::always("unused"),
        FixedTranscriber::silent(),
        EngineConfig::default(),
    )
    .await;

    let mut profile = StudentProfile::with_name(STUDENT, "Ana");
    profile.xp = 42;
    h.seed(&profile).await;

    let outcome = h.engine.process_event(&voice_event(STUDENT)).await;
    assert!(matches!(outcome, TurnOutcome::Skipped { .. }));
    assert_eq!(h.chat.calls(), 0);

    let profile = h.profile(STUDENT).await;
    assert_eq!(profile.xp, 42);
    assert!(profile.history.is_empty());
}

#[tokio::test]
async fn test_chat_failure_sends_fallback_and_mutates_nothing() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    db.migrate().await.unwrap();
    let store = ProfileStore::new(db);
    let transport = Arc::new(RecordingTransport::new());
    let chat = Arc::new(FailingChat::new());

    let engine = ConversationEngine::new(
        store.clone(),
        transport.clone(),
        chat.clone() as Arc<dyn ChatBackend>,
        Arc::new(FixedTranscriber::silent()) as Arc<dyn SpeechToText>,
        Arc::new(FixedSynthesizer::default()),
        EngineConfig::default(),
    );

    let mut profile = StudentProfile::with_name(STUDENT, "Ana");
    profile.xp = 42;
    store.save(&profile).await.unwrap();

    let outcome = engine.process_event(&text_event(STUDENT, "Hello")).await;
    match outcome {
        TurnOutcome::Failed(e) => assert_eq!(e.kind(), FailureKind::Backend),
        other => panic!("expected failure, got {:?}", other),
    }

    let texts = transport.sent_texts();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].1.contains("trouble thinking"));

    let profile = store.load_or_create(STUDENT, None).await.unwrap();
    assert_eq!(profile.xp, 42);
    assert!(profile.history.is_empty());
}

#[tokio::test]
async fn test_text_send_failure_fails_the_turn_as_transient_io() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    db.migrate().await.unwrap();
    let store = ProfileStore::new(db);
    let transport = Arc::new(RecordingTransport {
        fail_text_sends: true,
        ..RecordingTransport::new()
    });

    let engine = ConversationEngine::new(
        store,
        transport,
        Arc::new(ScriptedChat::always("ok")),
        Arc::new(FixedTranscriber::silent()),
        Arc::new(FixedSynthesizer::default()),
        EngineConfig::default(),
    );

    let outcome = engine.process_event(&text_event(STUDENT, "Hello")).await;
    match outcome {
        TurnOutcome::Failed(e) => assert_eq!(e.kind(), FailureKind::TransientIo),
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_voice_synthesis_failure_never_fails_the_turn() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    db.migrate().await.unwrap();
    let store = ProfileStore::new(db);
    let transport = Arc::new(RecordingTransport::new());

    let engine = ConversationEngine::new(
        store.clone(),
        transport.clone(),
        Arc::new(ScriptedChat::always("Well done, keep going!")),
        Arc::new(FixedTranscriber::silent()),
        Arc::new(FailingSynthesizer),
        EngineConfig::default(),
    );

    let outcome = engine.process_event(&text_event(STUDENT, "Hello")).await;
    match outcome {
        TurnOutcome::Replied { voice_sent, .. } => assert!(!voice_sent),
        other => panic!("expected a reply, got {:?}", other),
    }
    assert_eq!(transport.voice_count(), 0);
    assert_eq!(transport.sent_texts().len(), 1);
}

#[tokio::test]
async fn test_voice_reply_sent_for_substantial_content() {
    let h = Harness::new(
        ScriptedChat::always("Well done, keep going!"),
        FixedTranscriber::silent(),
        EngineConfig::default(),
    )
    .await;

    let outcome = h.engine.process_event(&text_event(STUDENT, "Hello")).await;
    match outcome {
        TurnOutcome::Replied { voice_sent, .. } => assert!(voice_sent),
        other => panic!("expected a reply, got {:?}", other),
    }
    assert_eq!(h.transport.voice_count(), 1);
}

#[tokio::test]
async fn test_mirror_mode_signs_replies_and_ignores_its_own_echo() {
    let h = Harness::new(
        ScriptedChat::always("Good! [XP]"),
        FixedTranscriber::silent(),
        EngineConfig { mirror_mode: true },
    )
    .await;

    let mut event = text_event(ME, "Hello");
    event.recipient = ME.to_string();
    event.from_self = true;

    let outcome = h.engine.process_event(&event).await;
    let TurnOutcome::Replied { text, .. } = outcome else {
        panic!("expected a reply, got {:?}", outcome);
    };
    assert!(text.starts_with("🤖"), "mirror replies must be signed");

    // Feed the reply back in as a new inbound message: the guard drops it.
    let mut echo = text_event(ME, &text);
    echo.recipient = ME.to_string();
    echo.from_self = true;
    let outcome = h.engine.process_event(&echo).await;
    assert!(matches!(outcome, TurnOutcome::Skipped { .. }));
    assert_eq!(h.chat.calls(), 1);
}

#[tokio::test]
async fn test_mirror_mode_rejects_other_senders() {
    let h = Harness::new(
        ScriptedChat::always("unused"),
        FixedTranscriber::silent(),
        EngineConfig { mirror_mode: true },
    )
    .await;

    let mut event = text_event(STUDENT, "Hello");
    event.recipient = ME.to_string();
    let outcome = h.engine.process_event(&event).await;
    assert!(matches!(outcome, TurnOutcome::Skipped { .. }));
    assert_eq!(h.chat.calls(), 0);
}

#[tokio::test]
async fn test_group_messages_are_rejected() {
    let h = Harness::new(
        ScriptedChat::always("unused"),
        FixedTranscriber::silent(),
        EngineConfig::default(),
    )
    .await;

    let mut event = text_event(STUDENT, "Hello");
    event.is_group = true;
    event.recipient = "12036302000000000@g.us".to_string();

    let outcome = h.engine.process_event(&event).await;
    assert!(matches!(outcome, TurnOutcome::Skipped { .. }));
    assert_eq!(h.chat.calls(), 0);
}

#[tokio::test]
async fn test_profile_command_reads_back_state() {
    let h = Harness::new(
        ScriptedChat::always("unused"),
        FixedTranscriber::silent(),
        EngineConfig::default(),
    )
    .await;

    let mut profile = StudentProfile::with_name(STUDENT, "Ana");
    profile.xp = 250;
    profile.level = Level::Advanced;
    h.seed(&profile).await;

    h.engine.process_event(&text_event(STUDENT, "!profile")).await;

    let texts = h.transport.sent_texts();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].1.contains("Ana"));
    assert!(texts[0].1.contains("Advanced"));
    assert!(texts[0].1.contains("250"));
    assert_eq!(h.chat.calls(), 0);
}

#[tokio::test]
async fn test_ping_command_replies_without_backends() {
    let h = Harness::new(
        ScriptedChat::always("unused"),
        FixedTranscriber::silent(),
        EngineConfig::default(),
    )
    .await;

    h.engine.process_event(&text_event(STUDENT, "!ping")).await;
    let texts = h.transport.sent_texts();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].1.contains("pong"));
    assert_eq!(h.chat.calls(), 0);
}
