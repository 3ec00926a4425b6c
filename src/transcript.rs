use std::time::Instant;

use crate::speech::SpeechEvent;

/// Accumulates recognizer output for the utterance currently being spoken
#[derive(Debug, Clone, Default)]
pub struct TranscriptBuffer {
    final_text: String,
    interim: String,
    last_activity: Option<Instant>,
}

impl TranscriptBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a text event and stamps speech activity. Returns false for
    /// events that carry no text.
    pub fn ingest(&mut self, event: &SpeechEvent, now: Instant) -> bool {
        match event {
            SpeechEvent::Interim(text) => {
                self.interim = text.clone();
            }
            SpeechEvent::Final(text) => {
                self.final_text.push_str(text.trim());
                self.final_text.push(' ');
                self.interim.clear();
            }
            SpeechEvent::Ended | SpeechEvent::Errored(_) => return false,
        }
        self.last_activity = Some(now);
        true
    }

    /// Text used for real-time matching: the final transcript once there is
    /// one, otherwise the latest interim.
    pub fn current(&self) -> &str {
        let final_text = self.final_text.trim();
        if final_text.is_empty() {
            self.interim.trim()
        } else {
            final_text
        }
    }

    /// Accumulated recognizer-confirmed text, used for finalize
    pub fn final_transcript(&self) -> &str {
        self.final_text.trim()
    }

    pub fn interim(&self) -> &str {
        self.interim.trim()
    }

    pub fn is_empty(&self) -> bool {
        self.final_transcript().is_empty() && self.interim().is_empty()
    }

    pub fn last_activity(&self) -> Option<Instant> {
        self.last_activity
    }

    /// Counts as activity without any text, e.g. listening just began
    pub fn touch(&mut self, now: Instant) {
        self.last_activity = Some(now);
    }

    pub fn clear(&mut self) {
        self.final_text.clear();
        self.interim.clear();
        self.last_activity = None;
    }
}
