use std::collections::BTreeSet;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::line::DialogLine;
use crate::util::{mean, percentage};

/// Session-wide scoring state. Accuracy is always derived from
/// `missed_words` and `total_words`, never stored.
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    total_words: usize,
    total_lines: usize,
    completed_lines: BTreeSet<usize>,
    missed_words: BTreeSet<String>,
    game_over_pending: bool,
    game_over: bool,
}

impl SessionStats {
    pub fn new(lines: &[DialogLine]) -> Self {
        Self {
            total_words: lines.iter().map(|l| l.words.len()).sum(),
            total_lines: lines.len(),
            ..Self::default()
        }
    }

    pub fn total_words(&self) -> usize {
        self.total_words
    }

    pub fn total_lines(&self) -> usize {
        self.total_lines
    }

    /// Returns true if the index was not recorded before
    pub fn record_completed(&mut self, line_index: usize) -> bool {
        if line_index >= self.total_lines {
            return false;
        }
        self.completed_lines.insert(line_index)
    }

    /// Adds missed words, ignoring ones already recorded. Returns how many were new.
    pub fn record_missed<I, W>(&mut self, words: I) -> usize
    where
        I: IntoIterator<Item = W>,
        W: Into<String>,
    {
        let mut added = 0;
        for word in words {
            let word: String = word.into();
            if !word.is_empty() && self.missed_words.insert(word) {
                added += 1;
            }
        }
        added
    }

    pub fn completed_lines(&self) -> &BTreeSet<usize> {
        &self.completed_lines
    }

    pub fn missed_words(&self) -> &BTreeSet<String> {
        &self.missed_words
    }

    pub fn is_line_completed(&self, line_index: usize) -> bool {
        self.completed_lines.contains(&line_index)
    }

    pub fn correct_words_count(&self) -> usize {
        self.total_words.saturating_sub(self.missed_words.len())
    }

    pub fn accuracy(&self) -> f64 {
        percentage(self.correct_words_count(), self.total_words)
            .map(f64::round)
            .unwrap_or(100.0)
    }

    pub fn are_all_lines_completed(&self) -> bool {
        self.total_lines > 0 && self.completed_lines.len() == self.total_lines
    }

    /// Marks game over as pending. Returns true the first time only, so the
    /// caller schedules the debounce once.
    pub fn request_game_over(&mut self) -> bool {
        if self.game_over || self.game_over_pending {
            return false;
        }
        self.game_over_pending = true;
        true
    }

    pub fn is_game_over_pending(&self) -> bool {
        self.game_over_pending
    }

    pub fn declare_game_over(&mut self) {
        self.game_over_pending = false;
        self.game_over = true;
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// `lines` supplies per-line scores for the average
    pub fn summary(&self, title: &str, lines: &[DialogLine]) -> SessionSummary {
        let scores: Vec<f64> = lines
            .iter()
            .filter(|l| l.is_completed())
            .map(|l| l.score)
            .collect();

        SessionSummary {
            title: title.to_string(),
            finished_at: Local::now(),
            accuracy: self.accuracy(),
            correct_words: self.correct_words_count(),
            total_words: self.total_words,
            missed_words: self.missed_words.iter().cloned().collect(),
            completed_lines: self.completed_lines.len(),
            total_lines: self.total_lines,
            average_line_score: mean(&scores).map(f64::round),
            game_over: self.game_over,
        }
    }
}

/// End-of-session results, serializable for `--summary-json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub title: String,
    pub finished_at: DateTime<Local>,
    pub accuracy: f64,
    pub correct_words: usize,
    pub total_words: usize,
    pub missed_words: Vec<String>,
    pub completed_lines: usize,
    pub total_lines: usize,
    /// Mean score of the completed lines
    pub average_line_score: Option<f64>,
    pub game_over: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines() -> Vec<DialogLine> {
        vec![
            DialogLine::new("Ann", "I like apples", 0),
            DialogLine::new("Bob", "red fox runs", 1),
        ]
    }

    #[test]
    fn total_words_is_sum_of_line_words() {
        let stats = SessionStats::new(&lines());
        assert_eq!(stats.total_words(), 6);
        assert_eq!(stats.total_lines(), 2);
        assert_eq!(stats.accuracy(), 100.0);
    }

    #[test]
    fn empty_session_is_fully_accurate() {
        let stats = SessionStats::new(&[]);
        assert_eq!(stats.total_words(), 0);
        assert_eq!(stats.accuracy(), 100.0);
        assert_eq!(stats.correct_words_count(), 0);
        assert!(!stats.are_all_lines_completed());
    }

    #[test]
    fn completed_lines_recorded_once() {
        let mut stats = SessionStats::new(&lines());
        assert!(stats.record_completed(1));
        assert!(!stats.record_completed(1));
        assert!(!stats.record_completed(7));
        assert_eq!(stats.completed_lines().len(), 1);
        assert!(!stats.are_all_lines_completed());

        stats.record_completed(0);
        assert!(stats.are_all_lines_completed());
    }

    #[test]
    fn missed_words_are_deduplicated() {
        let mut stats = SessionStats::new(&lines());
        assert_eq!(stats.record_missed(["red", "fox", "runs"]), 3);
        assert_eq!(stats.record_missed(vec!["fox".to_string(), "".to_string()]), 0);
        assert_eq!(stats.missed_words().len(), 3);
    }

    #[test]
    fn accuracy_derived_from_missed_words() {
        let mut stats = SessionStats::new(&lines());
        stats.record_missed(["runs"]);
        assert_eq!(stats.correct_words_count(), 5);
        // 5 / 6 = 83.33
        assert_eq!(stats.accuracy(), 83.0);

        stats.record_missed(["a", "b", "c", "d", "e", "f", "g"]);
        assert_eq!(stats.correct_words_count(), 0);
        assert_eq!(stats.accuracy(), 0.0);
    }

    #[test]
    fn game_over_requested_once() {
        let mut stats = SessionStats::new(&lines());
        assert!(stats.request_game_over());
        assert!(!stats.request_game_over());
        assert!(!stats.is_game_over());

        stats.declare_game_over();
        assert!(stats.is_game_over());
        assert!(!stats.is_game_over_pending());
        assert!(!stats.request_game_over());
    }

    #[test]
    fn summary_reflects_state() {
        let mut lines = lines();
        lines[0].mark_completed();
        lines[0].score = 100.0;
        let mut stats = SessionStats::new(&lines);
        stats.record_completed(0);
        stats.record_missed(["fox"]);
        let summary = stats.summary("Picnic", &lines);

        assert_eq!(summary.title, "Picnic");
        assert_eq!(summary.correct_words, 5);
        assert_eq!(summary.total_words, 6);
        assert_eq!(summary.missed_words, vec!["fox"]);
        assert_eq!(summary.completed_lines, 1);
        assert_eq!(summary.total_lines, 2);
        assert_eq!(summary.average_line_score, Some(100.0));

        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"accuracy\":83.0"));
    }
}
