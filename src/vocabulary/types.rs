//! Vocabulary data model: items, review status, interval ladder.

use std::fmt;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Spaced-repetition review intervals in days, ascending.
pub const INTERVAL_LADDER: [u32; 6] = [1, 3, 7, 14, 30, 90];

/// Interval (days) at which a word counts as mastered.
pub const MASTERY_INTERVAL_DAYS: u32 = 30;

/// Review count at which a word moves from new to learning.
pub const LEARNING_REVIEWS: u32 = 3;

/// Placeholder translation when generation is unavailable.
pub const FALLBACK_TRANSLATION: &str = "перевод";

/// Templated example sentence when generation is unavailable.
#[must_use]
pub fn fallback_example(word: &str) -> String {
    format!("I use the word {word} in sentences.")
}

/// Smallest ladder value strictly greater than `current`, saturating at
/// the ladder's maximum.
#[must_use]
pub fn advance_interval(current: u32) -> u32 {
    INTERVAL_LADDER
        .iter()
        .find(|&&interval| interval > current)
        .copied()
        .unwrap_or(INTERVAL_LADDER[INTERVAL_LADDER.len() - 1])
}

/// Learning status of a vocabulary item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordStatus {
    /// Recently added, few reviews so far.
    New,
    /// Reviewed several times, not yet retained long-term.
    Learning,
    /// Retained at a long interval.
    Mastered,
}

impl WordStatus {
    /// Stable name used in persistence.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Learning => "learning",
            Self::Mastered => "mastered",
        }
    }
}

impl fmt::Display for WordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One word in a user's vocabulary. The word itself is stored lower-cased
/// and is unique per user.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VocabularyItem {
    /// The word, lower-cased.
    pub word: String,
    /// Translation into the learner's language.
    pub translation: String,
    /// Example sentence using the word.
    pub example: String,
    /// Day the word was added.
    pub added_date: NaiveDate,
    /// Next day the word is due for review.
    pub next_review: NaiveDate,
    /// Current review interval, always a ladder value.
    pub interval_days: u32,
    /// Learning status.
    pub status: WordStatus,
    /// Total reviews, correct or not.
    pub reviews_count: u32,
    /// Correct recalls.
    pub correct_count: u32,
}

impl VocabularyItem {
    /// Create a fresh item: first interval, due tomorrow, status new.
    #[must_use]
    pub fn new(
        word: &str,
        translation: impl Into<String>,
        example: impl Into<String>,
        today: NaiveDate,
    ) -> Self {
        Self {
            word: word.to_lowercase(),
            translation: translation.into(),
            example: example.into(),
            added_date: today,
            next_review: today + Days::new(1),
            interval_days: INTERVAL_LADDER[0],
            status: WordStatus::New,
            reviews_count: 0,
            correct_count: 0,
        }
    }

    /// Whether the item is due for review on `today`.
    #[must_use]
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.next_review <= today
    }
}

/// A user's vocabulary document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VocabularyBook {
    /// All words, in insertion order.
    pub words: Vec<VocabularyItem>,
}

impl VocabularyBook {
    /// Case-insensitive lookup.
    #[must_use]
    pub fn find(&self, word: &str) -> Option<&VocabularyItem> {
        let lowered = word.to_lowercase();
        self.words.iter().find(|item| item.word == lowered)
    }

    /// Case-insensitive mutable lookup.
    pub fn find_mut(&mut self, word: &str) -> Option<&mut VocabularyItem> {
        let lowered = word.to_lowercase();
        self.words.iter_mut().find(|item| item.word == lowered)
    }

    /// Case-insensitive position lookup.
    #[must_use]
    pub fn position(&self, word: &str) -> Option<usize> {
        let lowered = word.to_lowercase();
        self.words.iter().position(|item| item.word == lowered)
    }
}

/// Counts by status plus the due-set size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct VocabularyStats {
    /// All words.
    pub total: usize,
    /// Words with status new.
    pub new: usize,
    /// Words with status learning.
    pub learning: usize,
    /// Words with status mastered.
    pub mastered: usize,
    /// Words due today (unbounded).
    pub due_today: usize,
}

/// Parse a generated vocabulary entry of the form
/// `Translation: ...` / `Example: ...`. Returns `None` when either line
/// is missing or empty, in which case the caller falls back to the
/// placeholder entry.
#[must_use]
pub fn parse_generated_entry(text: &str) -> Option<(String, String)> {
    let mut translation = String::new();
    let mut example = String::new();

    for line in text.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("Translation:") {
            translation = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("Example:") {
            example = rest.trim().to_string();
        }
    }

    if translation.is_empty() || example.is_empty() {
        None
    } else {
        Some((translation, example))
    }
}
