use serde::{Deserialize, Serialize};

use crate::matcher::{MatchResult, WordStatus};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineStatus {
    Pending,
    Completed,
}

/// Where the current line is in its listening lifecycle. Not stored on the
/// line itself; owned by the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum ListenPhase {
    /// Not listening, ready for a new attempt
    Idle,
    /// Waiting out the start guard before the backend is started
    Starting,
    Listening,
    /// Passed; waiting for the celebration delay before advancing
    Celebrating,
}

/// One scripted utterance and the per-word progress made on it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DialogLine {
    pub character: String,
    pub text: String,
    pub words: Vec<WordStatus>,
    pub order: usize,
    pub status: LineStatus,
    pub score: f64,
}

impl DialogLine {
    pub fn new(character: impl Into<String>, text: impl Into<String>, order: usize) -> Self {
        let text = text.into();
        let words = text.split_whitespace().map(WordStatus::pending).collect();
        Self {
            character: character.into(),
            text,
            words,
            order,
            status: LineStatus::Pending,
            score: 0.0,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == LineStatus::Completed
    }

    /// Completion is one-way. Returns true only on the first call.
    pub fn mark_completed(&mut self) -> bool {
        if self.is_completed() {
            return false;
        }
        self.status = LineStatus::Completed;
        true
    }

    pub fn reset_words(&mut self) {
        self.words.iter_mut().for_each(WordStatus::reset);
    }

    pub fn apply(&mut self, result: &MatchResult) {
        // the matcher returns one status per word, in order
        if result.words.len() == self.words.len() {
            self.words.clone_from(&result.words);
        }
    }
}
