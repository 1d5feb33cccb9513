//! Grammar-report parsing: finding counter and category classifier.
//!
//! Correction reports are free-form text from the grammar checker. The
//! classifier counts the enumerated findings and tags the report with the
//! fixed categories, matching cue words in both Russian and English.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Fixed error categories tracked by the analytics.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Wrong verb form or tense.
    VerbTense,
    /// Missing or wrong article.
    Articles,
    /// Wrong preposition.
    Prepositions,
    /// Scrambled word order.
    WordOrder,
    /// Subject-verb or noun-adjective agreement.
    Agreement,
    /// Unfinished sentence.
    Incomplete,
    /// Anything the cues above did not match.
    Other,
}

impl ErrorCategory {
    /// Stable snake_case name used in persistence and the remote API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VerbTense => "verb_tense",
            Self::Articles => "articles",
            Self::Prepositions => "prepositions",
            Self::WordOrder => "word_order",
            Self::Agreement => "agreement",
            Self::Incomplete => "incomplete",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cue words per category, Russian and English.
const CATEGORY_CUES: &[(ErrorCategory, &[&str])] = &[
    (ErrorCategory::VerbTense, &["глагол", "verb", "tense"]),
    (ErrorCategory::Articles, &["артикл", "article"]),
    (ErrorCategory::Prepositions, &["предлог", "preposition"]),
    (ErrorCategory::WordOrder, &["порядок слов", "word order"]),
    (ErrorCategory::Agreement, &["согласование", "agreement"]),
    (ErrorCategory::Incomplete, &["не закончено", "incomplete"]),
];

/// Parses correction reports into counts and categories.
pub struct ReportClassifier {
    finding_pattern: Regex,
}

impl ReportClassifier {
    /// Create a classifier.
    ///
    /// # Errors
    /// Returns an error if the finding pattern fails to compile.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            // A finding is one numbered list item: "1. ..." or "2) ...".
            finding_pattern: Regex::new(r"(?m)^\s*\d+\s*[.)]")?,
        })
    }

    /// Number of discrete enumerated findings in the report.
    #[must_use]
    pub fn count_findings(&self, report: &str) -> u32 {
        u32::try_from(self.finding_pattern.find_iter(report).count()).unwrap_or(u32::MAX)
    }

    /// Categories the report mentions. A single report may match several;
    /// a report matching none is classified as [`ErrorCategory::Other`].
    #[must_use]
    pub fn classify(&self, report: &str) -> Vec<ErrorCategory> {
        let lowered = report.to_lowercase();
        let mut matched: Vec<ErrorCategory> = CATEGORY_CUES
            .iter()
            .filter(|(_, cues)| cues.iter().any(|cue| lowered.contains(cue)))
            .map(|(category, _)| *category)
            .collect();
        if matched.is_empty() {
            matched.push(ErrorCategory::Other);
        }
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> ReportClassifier {
        ReportClassifier::new().unwrap()
    }

    #[test]
    fn test_count_findings() {
        let report = "1. Ошибка: I has a cat Правильно: I have a cat\n\
                      2. Ошибка: in monday Правильно: on Monday";
        assert_eq!(classifier().count_findings(report), 2);
    }

    #[test]
    fn test_count_ignores_inline_numbers() {
        assert_eq!(classifier().count_findings("I have 3 cats and 2 dogs"), 0);
    }

    #[test]
    fn test_classify_multiple_categories() {
        // One report carrying both a verb-tense cue and an article cue
        // tags both categories.
        let report = "1. Ошибка: неправильное время глагола\n2. Missing article before 'cat'";
        let categories = classifier().classify(report);
        assert!(categories.contains(&ErrorCategory::VerbTense));
        assert!(categories.contains(&ErrorCategory::Articles));
        assert_eq!(categories.len(), 2);
    }

    #[test]
    fn test_classify_english_cues() {
        let categories = classifier().classify("1. Wrong preposition; also check word order");
        assert!(categories.contains(&ErrorCategory::Prepositions));
        assert!(categories.contains(&ErrorCategory::WordOrder));
    }

    #[test]
    fn test_classify_falls_back_to_other() {
        let categories = classifier().classify("1. Misspelled word: recieve");
        assert_eq!(categories, vec![ErrorCategory::Other]);
    }

    #[test]
    fn test_category_names() {
        assert_eq!(ErrorCategory::VerbTense.as_str(), "verb_tense");
        assert_eq!(
            serde_json::to_string(&ErrorCategory::WordOrder).unwrap(),
            "\"word_order\""
        );
    }
}
