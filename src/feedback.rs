use std::io::{self, Write};

use rand::seq::SliceRandom;

/// Audio cue played after an attempt is scored
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum FeedbackCue {
    Great,
    Wrong,
}

/// Fire-and-forget audio feedback. Never awaited and never allowed to
/// influence scoring.
pub trait Announcer {
    fn speak(&mut self, cue: FeedbackCue);
}

impl<A: Announcer + ?Sized> Announcer for Box<A> {
    fn speak(&mut self, cue: FeedbackCue) {
        (**self).speak(cue)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAnnouncer;

impl Announcer for SilentAnnouncer {
    fn speak(&mut self, _cue: FeedbackCue) {}
}

/// Rings the terminal bell once for a success and twice for a retry
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalBell;

impl Announcer for TerminalBell {
    fn speak(&mut self, cue: FeedbackCue) {
        let bell = match cue {
            FeedbackCue::Great => "\x07",
            FeedbackCue::Wrong => "\x07\x07",
        };
        let mut out = io::stdout();
        if out.write_all(bell.as_bytes()).and_then(|_| out.flush()).is_err() {
            tracing::debug!(%cue, "unable to ring terminal bell");
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedbackKind {
    Success,
    Retry,
}

/// Message shown to the speaker after an attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Feedback {
    pub kind: FeedbackKind,
    pub message: String,
}

const SUCCESS_MESSAGES: &[&str] = &[
    "Great job!",
    "Perfect!",
    "Well said!",
    "Excellent!",
    "Nailed it!",
];

const RETRY_MESSAGE: &str = "Almost there, give it another try.";

impl Feedback {
    pub fn success() -> Self {
        let mut rng = rand::thread_rng();
        let message = SUCCESS_MESSAGES.choose(&mut rng).unwrap_or(&"Great job!");
        Self {
            kind: FeedbackKind::Success,
            message: (*message).to_string(),
        }
    }

    pub fn retry(missed: &[String]) -> Self {
        let message = if missed.is_empty() {
            RETRY_MESSAGE.to_string()
        } else {
            format!("{RETRY_MESSAGE} Missed: {}", missed.join(", "))
        };
        Self {
            kind: FeedbackKind::Retry,
            message,
        }
    }

    pub fn cue(&self) -> FeedbackCue {
        match self.kind {
            FeedbackKind::Success => FeedbackCue::Great,
            FeedbackKind::Retry => FeedbackCue::Wrong,
        }
    }
}
