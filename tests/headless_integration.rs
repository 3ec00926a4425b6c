use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use recite::{
    feedback::SilentAnnouncer,
    inactivity::InactivityMonitor,
    keyboard::KeyboardSpeechStream,
    line::DialogLine,
    runtime::{AppEvent, ChannelEventSource, FixedTicker, Runner},
    scheduler::SystemClock,
    session::SessionConfig,
    Rehearsal,
};

type KeyboardSession = Rehearsal<KeyboardSpeechStream, SilentAnnouncer>;

// Timings shortened so the real clock can drive a session in a test
fn quick_config() -> SessionConfig {
    SessionConfig {
        celebration_delay: Duration::from_millis(30),
        game_over_debounce: Duration::from_millis(10),
        start_guard: Duration::from_millis(5),
        inactivity: InactivityMonitor::new(Duration::from_millis(20), Duration::from_millis(60)),
        ..SessionConfig::default()
    }
}

fn keyboard_session(texts: &[&str]) -> KeyboardSession {
    let lines = texts
        .iter()
        .enumerate()
        .map(|(i, t)| DialogLine::new("Ann", *t, i))
        .collect();
    Rehearsal::with_clock(
        lines,
        KeyboardSpeechStream::new(),
        SilentAnnouncer,
        SystemClock,
        quick_config(),
    )
}

fn send_text(tx: &mpsc::Sender<AppEvent>, text: &str) {
    for c in text.chars() {
        tx.send(AppEvent::Key(KeyEvent::new(
            KeyCode::Char(c),
            KeyModifiers::NONE,
        )))
        .unwrap();
    }
    tx.send(AppEvent::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)))
        .unwrap();
}

// Minimal stand-in for the binary's key handling
fn apply_key(session: &mut KeyboardSession, key: KeyEvent) {
    match key.code {
        KeyCode::Char(c) => session.speech_mut().type_char(c),
        KeyCode::Enter => session.speech_mut().commit(),
        _ => {}
    }
}

#[test]
fn headless_spoken_script_reaches_game_over() {
    let mut session = keyboard_session(&["good morning", "how are you"]);

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        ChannelEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );

    session.start_listening();
    assert!(session.is_listening());
    send_text(&tx, "good morning");

    let mut second_line_sent = false;
    for _ in 0..400u32 {
        match runner.step() {
            AppEvent::Tick => session.on_tick(),
            AppEvent::Resize => {}
            AppEvent::Key(key) => {
                apply_key(&mut session, key);
                session.on_tick();
            }
        }

        if session.current_line_index() == 1 && !second_line_sent && !session.is_processing() {
            session.start_listening();
            if session.is_listening() {
                send_text(&tx, "how are you");
                second_line_sent = true;
            }
        }
        if session.is_game_over() {
            break;
        }
    }

    assert!(session.is_game_over(), "both lines should have been spoken");
    assert_eq!(session.stats().completed_lines().len(), 2);
    assert!(session.stats().missed_words().is_empty());
    assert_eq!(session.stats().accuracy(), 100.0);
}

#[test]
fn headless_silence_times_out() {
    let mut session = keyboard_session(&["see you later"]);

    let (_tx, rx) = mpsc::channel();
    let runner = Runner::new(
        ChannelEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );

    session.start_listening();
    for _ in 0..100u32 {
        if let AppEvent::Tick = runner.step() {
            session.on_tick();
        }
        if !session.is_listening() {
            break;
        }
    }

    assert!(!session.is_listening(), "silence should end the attempt");
    assert_eq!(session.stats().missed_words().len(), 3);
    assert!(session.feedback().is_some());
}

#[test]
fn keyboard_language_follows_session_config() {
    let mut config = quick_config();
    config.recognition.language = "fr-FR".to_string();
    let mut session = Rehearsal::with_clock(
        vec![DialogLine::new("Ann", "bonjour", 0)],
        KeyboardSpeechStream::new(),
        SilentAnnouncer,
        SystemClock,
        config,
    );

    session.start_listening();
    assert_eq!(session.speech().language(), Some("fr-FR"));
}
