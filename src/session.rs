use std::collections::BTreeSet;
use std::time::Duration;

use crate::feedback::Feedback;
use crate::inactivity::InactivityMonitor;
use crate::line::ListenPhase;
use crate::speech::RecognitionConfig;

/// Timings and thresholds for a practice session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Minimum match percentage for a line to pass on finalize
    pub pass_threshold: f64,
    pub celebration_delay: Duration,
    pub game_over_debounce: Duration,
    /// Minimum gap between stopping and restarting the recognizer
    pub start_guard: Duration,
    pub inactivity: InactivityMonitor,
    pub recognition: RecognitionConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            pass_threshold: 60.0,
            celebration_delay: Duration::from_millis(1800),
            game_over_debounce: Duration::from_millis(300),
            start_guard: Duration::from_millis(100),
            inactivity: InactivityMonitor::default(),
            recognition: RecognitionConfig::default(),
        }
    }
}

/// Read-only view of the session for renderers and callers
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub current_line_index: usize,
    pub total_lines: usize,
    pub current_transcript: String,
    pub phase: ListenPhase,
    pub is_listening: bool,
    pub is_processing: bool,
    pub speech_supported: bool,
    pub feedback: Option<Feedback>,
    pub missed_words_count: usize,
    pub correct_words_count: usize,
    pub accuracy: f64,
    pub total_words: usize,
    pub completed_lines: BTreeSet<usize>,
    pub game_over: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_session_config() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.pass_threshold, 60.0);
        assert_eq!(cfg.celebration_delay, Duration::from_millis(1800));
        assert_eq!(cfg.game_over_debounce, Duration::from_millis(300));
        assert_eq!(cfg.start_guard, Duration::from_millis(100));
        assert_eq!(cfg.inactivity.timeout, Duration::from_secs(5));
        assert_eq!(cfg.recognition.language, "en-US");
    }
}
