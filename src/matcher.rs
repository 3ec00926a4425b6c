use serde::{Deserialize, Serialize};

use crate::util::percentage;

/// Trailing punctuation ignored when comparing words.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', '!', '?', ';', ':'];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WordOutcome {
    Pending,
    Correct,
    Incorrect,
}

/// Correctness of one target word of a dialogue line
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordStatus {
    pub word: String,
    pub status: WordOutcome,
    pub was_said: bool,
}

impl WordStatus {
    pub fn pending(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            status: WordOutcome::Pending,
            was_said: false,
        }
    }

    pub fn reset(&mut self) {
        self.status = WordOutcome::Pending;
        self.was_said = false;
    }

    pub fn is_correct(&self) -> bool {
        self.status == WordOutcome::Correct
    }

    /// Lowercased word with trailing punctuation removed
    pub fn needle(&self) -> String {
        normalize_token(&self.word)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MatchResult {
    pub words: Vec<WordStatus>,
    pub correct_count: usize,
    pub all_words_correct: bool,
}

impl MatchResult {
    /// Share of correct words as a percentage, 0 for an empty line
    pub fn match_percentage(&self) -> f64 {
        percentage(self.correct_count, self.words.len()).unwrap_or(0.0)
    }

    /// Normalized forms of the words that were not matched
    pub fn incorrect_needles(&self) -> Vec<String> {
        self.words
            .iter()
            .filter(|w| w.status == WordOutcome::Incorrect)
            .map(WordStatus::needle)
            .collect()
    }
}

pub fn normalize_token(token: &str) -> String {
    token
        .trim()
        .trim_end_matches(TRAILING_PUNCTUATION)
        .to_lowercase()
}

/// Splits a raw transcript into normalized tokens. Empty tokens are dropped
/// before punctuation is stripped, so a token of bare punctuation stays as ""
/// and is contained in every target word.
pub fn spoken_tokens(spoken: &str) -> Vec<String> {
    spoken
        .trim()
        .to_lowercase()
        .split_whitespace()
        .filter(|t| !t.is_empty())
        .map(normalize_token)
        .collect()
}

/// Loose bidirectional containment. Short targets such as "a" match inside
/// almost any spoken token.
fn token_matches(needle: &str, token: &str) -> bool {
    token == needle || token.contains(needle) || needle.contains(token)
}

/// Matches every target word against the spoken transcript, ignoring order.
///
/// Pure: the input slice is left untouched and the updated statuses are
/// returned, so this can run on every interim transcript update.
pub fn match_words(words: &[WordStatus], spoken: &str) -> MatchResult {
    let tokens = spoken_tokens(spoken);

    let words: Vec<WordStatus> = words
        .iter()
        .map(|w| {
            let needle = w.needle();
            let matched = tokens.iter().any(|t| token_matches(&needle, t));
            WordStatus {
                word: w.word.clone(),
                status: if matched {
                    WordOutcome::Correct
                } else {
                    WordOutcome::Incorrect
                },
                was_said: matched,
            }
        })
        .collect();

    let correct_count = words.iter().filter(|w| w.is_correct()).count();
    let all_words_correct = !words.is_empty() && correct_count == words.len();

    MatchResult {
        words,
        correct_count,
        all_words_correct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(words: &[&str]) -> Vec<WordStatus> {
        words.iter().map(|w| WordStatus::pending(*w)).collect()
    }

    #[test]
    fn test_normalize_token() {
        assert_eq!(normalize_token("Apples!"), "apples");
        assert_eq!(normalize_token("fox,"), "fox");
        assert_eq!(normalize_token("  Hello?! "), "hello");
        assert_eq!(normalize_token("don't"), "don't");
    }

    #[test]
    fn test_spoken_tokens_drops_empty() {
        assert_eq!(
            spoken_tokens("  I   really like\tapples. "),
            vec!["i", "really", "like", "apples"]
        );
        assert!(spoken_tokens("   ").is_empty());
        assert_eq!(spoken_tokens("... !"), vec!["", ""]);
    }

    #[test]
    fn test_punctuation_only_speech_matches_any_target() {
        // a bare "?" from the recognizer normalizes to "" inside every needle
        let result = match_words(&line(&["fox"]), "?");
        assert_eq!(result.correct_count, 1);
        assert!(result.all_words_correct);
    }

    #[test]
    fn test_all_words_matched_with_extra_words() {
        let result = match_words(&line(&["I", "like", "apples"]), "I really like apples");

        assert_eq!(result.correct_count, 3);
        assert!(result.all_words_correct);
        assert!(result.words.iter().all(|w| w.was_said));
    }

    #[test]
    fn test_partial_match() {
        let result = match_words(&line(&["red", "fox", "runs"]), "red fox");

        assert_eq!(result.correct_count, 2);
        assert!(!result.all_words_correct);
        assert_eq!(result.words[2].status, WordOutcome::Incorrect);
        assert!(!result.words[2].was_said);
        assert!((result.match_percentage() - 66.666).abs() < 0.01);
        assert_eq!(result.incorrect_needles(), vec!["runs"]);
    }

    #[test]
    fn test_order_insensitive() {
        let result = match_words(&line(&["red", "fox", "runs"]), "runs fox red");
        assert!(result.all_words_correct);
    }

    #[test]
    fn test_case_and_punctuation_folded() {
        let result = match_words(&line(&["Hello,", "World!"]), "HELLO world.");
        assert!(result.all_words_correct);
    }

    #[test]
    fn test_bidirectional_containment() {
        // spoken token contains the needle
        let result = match_words(&line(&["run"]), "running");
        assert!(result.all_words_correct);

        // needle contains the spoken token
        let result = match_words(&line(&["running"]), "run");
        assert!(result.all_words_correct);

        // short words are matched generously
        let result = match_words(&line(&["a"]), "banana");
        assert!(result.all_words_correct);
    }

    #[test]
    fn test_silence_marks_everything_incorrect() {
        let result = match_words(&line(&["red", "fox", "runs"]), "");

        assert_eq!(result.correct_count, 0);
        assert_eq!(result.match_percentage(), 0.0);
        assert!(result
            .words
            .iter()
            .all(|w| w.status == WordOutcome::Incorrect));
        assert_eq!(result.incorrect_needles(), vec!["red", "fox", "runs"]);
    }

    #[test]
    fn test_input_not_mutated_and_reinvocable() {
        let words = line(&["red", "fox"]);
        let first = match_words(&words, "red");
        let second = match_words(&words, "red");

        assert_eq!(first, second);
        assert!(words.iter().all(|w| w.status == WordOutcome::Pending));
    }

    #[test]
    fn test_empty_line_is_never_all_correct() {
        let result = match_words(&[], "anything");
        assert!(!result.all_words_correct);
        assert_eq!(result.match_percentage(), 0.0);
    }

    #[test]
    fn test_punctuation_only_target_matches_any_speech() {
        // the needle collapses to "" which every spoken token contains
        let result = match_words(&line(&["..."]), "anything");
        assert_eq!(result.correct_count, 1);

        let result = match_words(&line(&["..."]), "");
        assert_eq!(result.correct_count, 0);
    }

    #[test]
    fn test_word_status_reset() {
        let mut w = WordStatus {
            word: "fox".into(),
            status: WordOutcome::Correct,
            was_said: true,
        };
        w.reset();
        assert_eq!(w, WordStatus::pending("fox"));
    }
}
