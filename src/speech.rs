use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::SpeechError;

/// Event delivered by a recognition backend
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpeechEvent {
    /// Provisional text for the utterance in progress, replaces any previous interim
    Interim(String),
    /// Recognizer-confirmed text, appended to the final transcript
    Final(String),
    /// The backend stopped, on request or by itself
    Ended,
    Errored(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionConfig {
    pub continuous: bool,
    pub interim_results: bool,
    pub language: String,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            continuous: true,
            interim_results: true,
            language: "en-US".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecognitionResult {
    pub transcript: String,
    pub is_final: bool,
}

impl RecognitionResult {
    pub fn interim(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: false,
        }
    }

    pub fn final_text(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: true,
        }
    }
}

/// One result callback from a recognizer that reports a growing result list
/// together with the index of the first changed entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecognitionBatch {
    pub result_index: usize,
    pub results: Vec<RecognitionResult>,
}

impl RecognitionBatch {
    /// Expands the changed results, in index order, into events. Final results
    /// become one event each; interim results are concatenated into a single
    /// trailing interim event.
    pub fn into_events(self) -> Vec<SpeechEvent> {
        let mut events = Vec::new();
        let mut interim = String::new();

        for result in self.results.into_iter().skip(self.result_index) {
            if result.is_final {
                events.push(SpeechEvent::Final(result.transcript));
            } else {
                interim.push_str(&result.transcript);
            }
        }

        if !interim.is_empty() {
            events.push(SpeechEvent::Interim(interim));
        }
        events
    }
}

/// A speech-to-text source owned by a single controller.
///
/// Events are pulled with [`SpeechStream::poll_event`] so the controller
/// processes them one at a time on its own thread of control.
pub trait SpeechStream {
    /// Whether the backend exists in this environment at all
    fn is_available(&self) -> bool;
    fn start(&mut self, config: &RecognitionConfig) -> Result<(), SpeechError>;
    fn stop(&mut self) -> Result<(), SpeechError>;
    fn is_active(&self) -> bool;
    /// Next pending event, if any
    fn poll_event(&mut self) -> Option<SpeechEvent>;
}

impl<S: SpeechStream + ?Sized> SpeechStream for Box<S> {
    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn start(&mut self, config: &RecognitionConfig) -> Result<(), SpeechError> {
        (**self).start(config)
    }

    fn stop(&mut self) -> Result<(), SpeechError> {
        (**self).stop()
    }

    fn is_active(&self) -> bool {
        (**self).is_active()
    }

    fn poll_event(&mut self) -> Option<SpeechEvent> {
        (**self).poll_event()
    }
}

/// Stand-in for environments without any recognition backend
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedSpeechStream;

impl SpeechStream for UnsupportedSpeechStream {
    fn is_available(&self) -> bool {
        false
    }

    fn start(&mut self, _config: &RecognitionConfig) -> Result<(), SpeechError> {
        Err(SpeechError::Unsupported)
    }

    fn stop(&mut self) -> Result<(), SpeechError> {
        Err(SpeechError::Unsupported)
    }

    fn is_active(&self) -> bool {
        false
    }

    fn poll_event(&mut self) -> Option<SpeechEvent> {
        None
    }
}

/// Deterministic backend fed by hand, for tests and headless runs
#[derive(Debug, Default)]
pub struct ScriptedSpeechStream {
    queue: VecDeque<SpeechEvent>,
    active: bool,
    failing_starts: usize,
    /// Events released when `stop` is called, e.g. a final flush
    on_stop: Vec<SpeechEvent>,
    pub start_calls: usize,
    pub stop_calls: usize,
    pub last_config: Option<RecognitionConfig>,
}

impl ScriptedSpeechStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `n` calls to `start` fail
    pub fn fail_next_starts(&mut self, n: usize) {
        self.failing_starts = n;
    }

    pub fn push(&mut self, event: SpeechEvent) {
        self.queue.push_back(event);
    }

    pub fn push_batch(&mut self, batch: RecognitionBatch) {
        self.queue.extend(batch.into_events());
    }

    pub fn interim(&mut self, text: &str) {
        self.push(SpeechEvent::Interim(text.to_string()));
    }

    pub fn final_text(&mut self, text: &str) {
        self.push(SpeechEvent::Final(text.to_string()));
    }

    pub fn flush_on_stop(&mut self, event: SpeechEvent) {
        self.on_stop.push(event);
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl SpeechStream for ScriptedSpeechStream {
    fn is_available(&self) -> bool {
        true
    }

    fn start(&mut self, config: &RecognitionConfig) -> Result<(), SpeechError> {
        self.start_calls += 1;
        if self.failing_starts > 0 {
            self.failing_starts -= 1;
            return Err(SpeechError::Backend("audio-capture".to_string()));
        }
        if self.active {
            return Err(SpeechError::AlreadyStarted);
        }
        self.active = true;
        self.last_config = Some(config.clone());
        Ok(())
    }

    fn stop(&mut self) -> Result<(), SpeechError> {
        self.stop_calls += 1;
        if !self.active {
            return Err(SpeechError::NotStarted);
        }
        self.active = false;
        self.queue.extend(self.on_stop.drain(..));
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
    use assert_matches::assert_matches;

    #[test]
    fn default_recognition_config() {
        let cfg = RecognitionConfig::default();
        assert!(cfg.continuous);
        assert!(cfg.interim_results);
        assert_eq!(cfg.language, "en-US");
    }

    #[test]
    fn batch_expands_from_result_index() {
        let batch = RecognitionBatch {
            result_index: 1,
            results: vec![
                RecognitionResult::final_text("already seen "),
                RecognitionResult::final_text("red fox "),
                RecognitionResult::interim("ru"),
                RecognitionResult::interim("ns"),
            ],
        };

        assert_eq!(
            batch.into_events(),
            vec![
                SpeechEvent::Final("red fox ".into()),
                SpeechEvent::Interim("runs".into()),
            ]
        );
    }

    #[test]
    fn batch_with_index_past_end_is_empty() {
        let batch = RecognitionBatch {
            result_index: 3,
            results: vec![RecognitionResult::interim("hi")],
        };
        assert!(batch.into_events().is_empty());
    }

    #[test]
    fn scripted_stream_lifecycle() {
        let mut stream = ScriptedSpeechStream::new();
        let cfg = RecognitionConfig::default();

        assert_matches!(stream.stop(), Err(SpeechError::NotStarted));
        stream.start(&cfg).unwrap();
        assert!(stream.is_active());
        assert_matches!(stream.start(&cfg), Err(SpeechError::AlreadyStarted));

        stream.flush_on_stop(SpeechEvent::Final("hello".into()));
        stream.stop().unwrap();
        assert!(!stream.is_active());
        assert_eq!(
            stream.poll_event(),
            Some(SpeechEvent::Final("hello".into()))
        );
        assert_eq!(stream.poll_event(), Some(SpeechEvent::Ended));
        assert_eq!(stream.poll_event(), None);
    }

    #[test]
    fn scripted_stream_failing_starts() {
        let mut stream = ScriptedSpeechStream::new();
        stream.fail_next_starts(1);
        let cfg = RecognitionConfig::default();

        assert!(stream.start(&cfg).is_err());
        assert!(stream.start(&cfg).is_ok());
        assert_eq!(stream.start_calls, 2);
    }

    #[test]
    fn unsupported_stream_reports_unavailable() {
        let mut stream = UnsupportedSpeechStream;
        assert!(!stream.is_available());
        assert_matches!(
            stream.start(&RecognitionConfig::default()),
            Err(SpeechError::Unsupported)
        );
        assert_eq!(stream.poll_event(), None);
    }
}
