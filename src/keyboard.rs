use std::collections::VecDeque;

use crate::error::SpeechError;
use crate::speech::{RecognitionConfig, SpeechEvent, SpeechStream};

/// Recognizer backed by the keyboard: typed text plays the role of speech.
///
/// Every keystroke re-emits the phrase in progress as an interim result and
/// committing the phrase (Enter) turns it into a final one, which mirrors how
/// a streaming recognizer revises and then confirms an utterance.
#[derive(Debug, Default)]
pub struct KeyboardSpeechStream {
    phrase: String,
    queue: VecDeque<SpeechEvent>,
    active: bool,
    language: Option<String>,
}

impl KeyboardSpeechStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn type_char(&mut self, c: char) {
        if !self.active {
            return;
        }
        self.phrase.push(c);
        self.queue.push_back(SpeechEvent::Interim(self.phrase.clone()));
    }

    pub fn backspace(&mut self) {
        if !self.active || self.phrase.pop().is_none() {
            return;
        }
        self.queue.push_back(SpeechEvent::Interim(self.phrase.clone()));
    }

    /// Confirms the phrase in progress as a final result
    pub fn commit(&mut self) {
        if !self.active || self.phrase.trim().is_empty() {
            return;
        }
        let phrase = std::mem::take(&mut self.phrase);
        self.queue.push_back(SpeechEvent::Final(phrase));
    }
}

impl SpeechStream for KeyboardSpeechStream {
    fn is_available(&self) -> bool {
        true
    }

    fn start(&mut self, config: &RecognitionConfig) -> Result<(), SpeechError> {
        if self.active {
            return Err(SpeechError::AlreadyStarted);
        }
        self.active = true;
        self.phrase.clear();
        self.language = Some(config.language.clone());
        Ok(())
    }

    fn stop(&mut self) -> Result<(), SpeechError> {
        if !self.active {
            return Err(SpeechError::NotStarted);
        }
        self.commit();
        self.phrase.clear();
        self.active = false;
        self.queue.push_back(SpeechEvent::Ended);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn poll_event(&mut self) -> Option<SpeechEvent> {
        self.queue.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(stream: &mut KeyboardSpeechStream) -> Vec<SpeechEvent> {
        std::iter::from_fn(|| stream.poll_event()).collect()
    }

    #[test]
    fn typing_before_start_is_ignored() {
        let mut stream = KeyboardSpeechStream::new();
        stream.type_char('a');
        assert!(drain(&mut stream).is_empty());
    }

    #[test]
    fn keystrokes_emit_interims_and_commit_emits_final() {
        let mut stream = KeyboardSpeechStream::new();
        stream.start(&RecognitionConfig::default()).unwrap();
        assert_eq!(stream.language(), Some("en-US"));

        stream.type_char('h');
        stream.type_char('i');
        stream.type_char('x');
        stream.backspace();
        stream.commit();

        assert_eq!(
            drain(&mut stream),
            vec![
                SpeechEvent::Interim("h".into()),
                SpeechEvent::Interim("hi".into()),
                SpeechEvent::Interim("hix".into()),
                SpeechEvent::Interim("hi".into()),
                SpeechEvent::Final("hi".into()),
            ]
        );
        assert_eq!(stream.phrase(), "");
    }

    #[test]
    fn stop_flushes_phrase_as_final() {
        let mut stream = KeyboardSpeechStream::new();
        stream.start(&RecognitionConfig::default()).unwrap();
        stream.type_char('o');
        stream.type_char('k');
        let _ = drain(&mut stream);

        stream.stop().unwrap();
        assert_eq!(
            drain(&mut stream),
            vec![SpeechEvent::Final("ok".into()), SpeechEvent::Ended]
        );
        assert!(stream.stop().is_err());
    }
}
