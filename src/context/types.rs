//! Learner profile and conversation context types.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::gateway::ChatTurn;

/// Self-reported proficiency level of a learner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProficiencyLevel {
    /// Just starting out.
    Beginner,
    /// Comfortable with everyday conversation.
    #[default]
    Intermediate,
    /// Near-fluent.
    Advanced,
}

impl ProficiencyLevel {
    /// Stable name used in prompts and persistence.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }
}

impl fmt::Display for ProficiencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProficiencyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            other => Err(format!("unknown proficiency level: {other}")),
        }
    }
}

/// Stable information about a learner used to personalize replies and
/// steer transcription.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LearnerProfile {
    /// Free-form interest tags ("travel", "music", ...).
    pub interests: Vec<String>,
    /// Proficiency level.
    pub level: ProficiencyLevel,
}

impl LearnerProfile {
    /// Create a profile from interest tags and a level.
    #[must_use]
    pub fn new(interests: Vec<String>, level: ProficiencyLevel) -> Self {
        Self { interests, level }
    }

    /// One-line persona description injected into generation prompts.
    #[must_use]
    pub fn persona_line(&self) -> String {
        let interests = if self.interests.is_empty() {
            "various topics".to_string()
        } else {
            self.interests.join(", ")
        };
        format!(
            "The learner is interested in {interests} and their English level is {}.",
            self.level
        )
    }
}

/// Per-user conversation state: a rolling message window plus the profile.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversationContext {
    /// Learner profile.
    pub profile: LearnerProfile,
    /// Rolling turn window, oldest first; the front is evicted once the
    /// window is full.
    pub messages: VecDeque<ChatTurn>,
    /// When the context was created.
    pub created_at: DateTime<Utc>,
    /// When the context was last mutated.
    pub updated_at: DateTime<Utc>,
}

impl ConversationContext {
    /// Create a fresh context for a newly registered profile.
    #[must_use]
    pub fn new(profile: LearnerProfile) -> Self {
        let now = Utc::now();
        Self {
            profile,
            messages: VecDeque::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a turn, evicting the oldest once `window` is exceeded.
    pub fn push(&mut self, turn: ChatTurn, window: usize) {
        self.messages.push_back(turn);
        while self.messages.len() > window {
            self.messages.pop_front();
        }
        self.updated_at = Utc::now();
    }
}
