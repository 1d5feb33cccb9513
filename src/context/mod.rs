//! Per-user conversation history and learner profile.
//!
//! The store is the single writer for conversation state; readers always
//! receive copies, never live references, so concurrent pipelines for
//! different users cannot observe each other's mutations mid-flight.

pub mod types;

pub use types::{ConversationContext, LearnerProfile, ProficiencyLevel};

use dashmap::DashMap;
use tracing::debug;

use crate::gateway::ChatTurn;
use crate::ids::UserId;

/// How many recent turns feed the transcription hint.
const HINT_TURNS: usize = 3;
/// How many characters of each turn the hint keeps.
const HINT_TURN_CHARS: usize = 50;

/// Thread-safe store of per-user conversation contexts.
pub struct ContextStore {
    window: usize,
    contexts: DashMap<UserId, ConversationContext>,
}

impl ContextStore {
    /// Create a store with the given rolling-window size.
    #[must_use]
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            contexts: DashMap::new(),
        }
    }

    /// Whether the user has registered a profile.
    #[must_use]
    pub fn has_profile(&self, user: UserId) -> bool {
        self.contexts.contains_key(&user)
    }

    /// Register (or replace) a user's profile, keeping any existing
    /// conversation history.
    pub fn register_profile(&self, user: UserId, profile: LearnerProfile) {
        match self.contexts.entry(user) {
            dashmap::mapref::entry::Entry::Occupied(mut entry) => {
                entry.get_mut().profile = profile;
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(ConversationContext::new(profile));
            }
        }
        debug!(%user, "Registered learner profile");
    }

    /// Copy of the user's profile, if registered.
    #[must_use]
    pub fn profile(&self, user: UserId) -> Option<LearnerProfile> {
        self.contexts.get(&user).map(|ctx| ctx.profile.clone())
    }

    /// Copy of the user's rolling conversation history, oldest first.
    #[must_use]
    pub fn history(&self, user: UserId) -> Vec<ChatTurn> {
        self.contexts
            .get(&user)
            .map(|ctx| ctx.messages.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Append a learner turn to the context. Ignored when no profile
    /// exists; the pipeline gates on [`Self::has_profile`] first.
    pub fn push_user_turn(&self, user: UserId, content: &str) {
        if let Some(mut ctx) = self.contexts.get_mut(&user) {
            let window = self.window;
            ctx.push(ChatTurn::user(content), window);
        }
    }

    /// Append a coach turn to the context. Ignored when no profile exists.
    pub fn push_assistant_turn(&self, user: UserId, content: &str) {
        if let Some(mut ctx) = self.contexts.get_mut(&user) {
            let window = self.window;
            ctx.push(ChatTurn::assistant(content), window);
        }
    }

    /// Build the speech-recognition context hint: the learner's interests
    /// plus snippets of the most recent turns.
    #[must_use]
    pub fn transcription_hint(&self, user: UserId) -> Option<String> {
        let ctx = self.contexts.get(&user)?;

        let interests = if ctx.profile.interests.is_empty() {
            "various topics".to_string()
        } else {
            ctx.profile.interests.join(", ")
        };
        let mut hint = format!("The speaker is interested in {interests}.");

        let skip = ctx.messages.len().saturating_sub(HINT_TURNS);
        let snippets: Vec<String> = ctx
            .messages
            .iter()
            .skip(skip)
            .map(|turn| turn.content.chars().take(HINT_TURN_CHARS).collect())
            .collect();
        if !snippets.is_empty() {
            hint.push_str(" Recent conversation: ");
            hint.push_str(&snippets.join(" "));
        }

        Some(hint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_profile(user: UserId) -> ContextStore {
        let store = ContextStore::new(10);
        store.register_profile(
            user,
            LearnerProfile::new(vec!["travel".to_string()], ProficiencyLevel::Intermediate),
        );
        store
    }

    #[test]
    fn test_profile_lifecycle() {
        let user = UserId::new(1);
        let store = ContextStore::new(10);
        assert!(!store.has_profile(user));
        assert!(store.profile(user).is_none());

        store.register_profile(user, LearnerProfile::default());
        assert!(store.has_profile(user));

        // Re-registering keeps history.
        store.push_user_turn(user, "hello");
        store.register_profile(
            user,
            LearnerProfile::new(vec!["films".to_string()], ProficiencyLevel::Advanced),
        );
        assert_eq!(store.history(user).len(), 1);
        assert_eq!(store.profile(user).unwrap().interests, vec!["films"]);
    }

    #[test]
    fn test_turns_ignored_without_profile() {
        let user = UserId::new(2);
        let store = ContextStore::new(10);
        store.push_user_turn(user, "lost");
        assert!(store.history(user).is_empty());
        assert!(!store.has_profile(user));
    }

    #[test]
    fn test_history_is_a_copy() {
        let user = UserId::new(3);
        let store = store_with_profile(user);
        store.push_user_turn(user, "one");

        let snapshot = store.history(user);
        store.push_assistant_turn(user, "two");

        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.history(user).len(), 2);
    }

    #[test]
    fn test_window_cap() {
        let user = UserId::new(4);
        let store = ContextStore::new(2);
        store.register_profile(user, LearnerProfile::default());
        store.push_user_turn(user, "a");
        store.push_assistant_turn(user, "b");
        store.push_user_turn(user, "c");

        let history = store.history(user);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "b");
        assert_eq!(history[1].content, "c");
    }

    #[test]
    fn test_transcription_hint() {
        let user = UserId::new(5);
        let store = store_with_profile(user);
        assert_eq!(
            store.transcription_hint(user).unwrap(),
            "The speaker is interested in travel."
        );

        store.push_user_turn(user, "I went to Spain last year");
        store.push_assistant_turn(user, "That sounds wonderful, what did you see?");
        let hint = store.transcription_hint(user).unwrap();
        assert!(hint.contains("Recent conversation:"));
        assert!(hint.contains("I went to Spain"));

        assert!(store.transcription_hint(UserId::new(99)).is_none());
    }

    #[test]
    fn test_hint_truncates_long_turns() {
        let user = UserId::new(6);
        let store = store_with_profile(user);
        store.push_user_turn(user, &"x".repeat(200));
        let hint = store.transcription_hint(user).unwrap();
        assert!(!hint.contains(&"x".repeat(51)));
        assert!(hint.contains(&"x".repeat(50)));
    }
}
