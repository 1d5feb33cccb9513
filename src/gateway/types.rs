//! Request and response types shared with gateway callers.

use serde::{Deserialize, Serialize};

/// Role of a conversation turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// The learner.
    User,
    /// The coach.
    Assistant,
}

impl ChatRole {
    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One turn of a conversation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Who spoke.
    pub role: ChatRole,
    /// What was said.
    pub content: String,
}

impl ChatTurn {
    /// Create a learner turn.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Create a coach turn.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Result of a grammar check: free-form text listing the findings as a
/// numbered list, or the clean marker when nothing was wrong.
#[derive(Clone, Debug)]
pub struct CorrectionReport {
    text: String,
}

impl CorrectionReport {
    /// Marker the checker emits for a message with no mistakes.
    pub const CLEAN_MARKER: &'static str = "No errors found.";

    /// Wrap raw checker output.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into().trim().to_string(),
        }
    }

    /// An empty report.
    #[must_use]
    pub fn clean() -> Self {
        Self::new(Self::CLEAN_MARKER)
    }

    /// Whether the checker found nothing to correct.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.text.is_empty() || self.text == Self::CLEAN_MARKER
    }

    /// Raw report text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}
