//! Spaced-repetition scheduler over per-user vocabulary books.

use std::sync::Arc;

use chrono::{Days, NaiveDate, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::gateway::InferenceGateway;
use crate::ids::UserId;
use crate::storage::{DocumentStore, StoreResult};

use super::types::{
    FALLBACK_TRANSLATION, LEARNING_REVIEWS, MASTERY_INTERVAL_DAYS, VocabularyBook, VocabularyItem,
    VocabularyStats, WordStatus, advance_interval, fallback_example, parse_generated_entry,
};

/// System prompt for vocabulary entry generation.
const VOCAB_TEACHER_PROMPT: &str = "You are a helpful English-Russian vocabulary teacher. \
Provide concise translations and natural example sentences.";

/// Prompt asking for one vocabulary entry in the parseable two-line form.
fn entry_prompt(word: &str) -> String {
    format!(
        "Generate vocabulary data for the English word: \"{word}\"\n\n\
         Provide:\n\
         1. Russian translation (one or two words, most common meaning)\n\
         2. Example sentence in English using this word\n\n\
         Format your response EXACTLY like this:\n\
         Translation: [Russian translation]\n\
         Example: [English example sentence]"
    )
}

/// Scheduler deciding, per vocabulary item, when it is next due and how
/// its interval evolves with recall outcomes.
///
/// Mutations are atomic per user (per-user lock, whole-document
/// write-through); readers receive copies.
pub struct VocabularyScheduler {
    gateway: Arc<dyn InferenceGateway>,
    store: Arc<dyn DocumentStore>,
    books: DashMap<UserId, VocabularyBook>,
    locks: DashMap<UserId, Arc<Mutex<()>>>,
}

impl VocabularyScheduler {
    /// Create a scheduler backed by the given gateway and store.
    #[must_use]
    pub fn new(gateway: Arc<dyn InferenceGateway>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            gateway,
            store,
            books: DashMap::new(),
            locks: DashMap::new(),
        }
    }

    fn user_lock(&self, user: UserId) -> Arc<Mutex<()>> {
        self.locks.entry(user).or_default().clone()
    }

    async fn load_into_cache(&self, user: UserId) -> StoreResult<()> {
        if self.books.contains_key(&user) {
            return Ok(());
        }
        if let Some(json) = self.store.load(user).await? {
            let book: VocabularyBook = serde_json::from_str(&json)?;
            self.books.insert(user, book);
            debug!(%user, "Loaded vocabulary document");
        }
        Ok(())
    }

    async fn persist(&self, user: UserId) -> StoreResult<()> {
        let doc = match self.books.get(&user) {
            Some(book) => serde_json::to_string(&*book)?,
            None => return Ok(()),
        };
        self.store.save(user, doc).await
    }

    /// Add a word. Idempotent: when the word already exists
    /// (case-insensitively), the stored item is returned unchanged and no
    /// generation is attempted. Otherwise the translation and example are
    /// generated, falling back to a placeholder entry so the add never
    /// fails on provider trouble.
    ///
    /// # Errors
    /// Returns an error if the document cannot be loaded or saved.
    pub async fn add(&self, user: UserId, word: &str) -> StoreResult<VocabularyItem> {
        self.add_at(user, word, Utc::now().date_naive()).await
    }

    /// Add a word as of an explicit day.
    ///
    /// # Errors
    /// Returns an error if the document cannot be loaded or saved.
    pub async fn add_at(
        &self,
        user: UserId,
        word: &str,
        today: NaiveDate,
    ) -> StoreResult<VocabularyItem> {
        let lock = self.user_lock(user);
        let _guard = lock.lock().await;
        self.load_into_cache(user).await?;

        if let Some(existing) = self.books.get(&user).and_then(|book| book.find(word).cloned()) {
            debug!(%user, word, "Word already in vocabulary");
            return Ok(existing);
        }

        let (translation, example) = match self
            .gateway
            .generate_text(VOCAB_TEACHER_PROMPT, &entry_prompt(word))
            .await
        {
            Ok(reply) => parse_generated_entry(&reply).unwrap_or_else(|| {
                warn!(%user, word, "Generated entry missing expected fields, using fallback");
                (FALLBACK_TRANSLATION.to_string(), fallback_example(word))
            }),
            Err(err) => {
                warn!(%user, word, %err, "Entry generation failed, using fallback");
                (FALLBACK_TRANSLATION.to_string(), fallback_example(word))
            }
        };

        let item = VocabularyItem::new(word, translation, example, today);
        self.books.entry(user).or_default().words.push(item.clone());
        self.persist(user).await?;

        info!(%user, word = %item.word, "Added vocabulary word");
        Ok(item)
    }

    /// Record a correct recall: advance the interval along the ladder and
    /// update the status. Returns the updated item, or `None` when the
    /// word is unknown (no mutation happens).
    ///
    /// # Errors
    /// Returns an error if the document cannot be loaded or saved.
    pub async fn mark_correct(&self, user: UserId, word: &str) -> StoreResult<Option<VocabularyItem>> {
        self.mark_correct_at(user, word, Utc::now().date_naive())
            .await
    }

    /// Record a correct recall as of an explicit day.
    ///
    /// # Errors
    /// Returns an error if the document cannot be loaded or saved.
    pub async fn mark_correct_at(
        &self,
        user: UserId,
        word: &str,
        today: NaiveDate,
    ) -> StoreResult<Option<VocabularyItem>> {
        let lock = self.user_lock(user);
        let _guard = lock.lock().await;
        self.load_into_cache(user).await?;

        let updated = {
            let Some(mut book) = self.books.get_mut(&user) else {
                return Ok(None);
            };
            let Some(item) = book.find_mut(word) else {
                return Ok(None);
            };

            item.reviews_count += 1;
            item.correct_count += 1;
            item.interval_days = advance_interval(item.interval_days);
            item.next_review = today + Days::new(u64::from(item.interval_days));

            if item.interval_days >= MASTERY_INTERVAL_DAYS {
                item.status = WordStatus::Mastered;
            } else if item.reviews_count >= LEARNING_REVIEWS {
                item.status = WordStatus::Learning;
            }

            item.clone()
        };

        self.persist(user).await?;
        info!(%user, word = %updated.word, interval = updated.interval_days, "Recall correct");
        Ok(Some(updated))
    }

    /// Record a forgotten word: the interval drops back to the start of
    /// the ladder and the word becomes due tomorrow. Returns the updated
    /// item, or `None` when the word is unknown.
    ///
    /// # Errors
    /// Returns an error if the document cannot be loaded or saved.
    pub async fn mark_forgot(&self, user: UserId, word: &str) -> StoreResult<Option<VocabularyItem>> {
        self.mark_forgot_at(user, word, Utc::now().date_naive())
            .await
    }

    /// Record a forgotten word as of an explicit day.
    ///
    /// # Errors
    /// Returns an error if the document cannot be loaded or saved.
    pub async fn mark_forgot_at(
        &self,
        user: UserId,
        word: &str,
        today: NaiveDate,
    ) -> StoreResult<Option<VocabularyItem>> {
        let lock = self.user_lock(user);
        let _guard = lock.lock().await;
        self.load_into_cache(user).await?;

        let updated = {
            let Some(mut book) = self.books.get_mut(&user) else {
                return Ok(None);
            };
            let Some(item) = book.find_mut(word) else {
                return Ok(None);
            };

            item.reviews_count += 1;
            item.interval_days = super::types::INTERVAL_LADDER[0];
            item.next_review = today + Days::new(1);
            item.status = WordStatus::Learning;

            item.clone()
        };

        self.persist(user).await?;
        info!(%user, word = %updated.word, "Recall forgotten, interval reset");
        Ok(Some(updated))
    }

    /// Words due for review: `next_review <= today`, oldest due first,
    /// truncated to `limit`.
    ///
    /// # Errors
    /// Returns an error if the document cannot be loaded.
    pub async fn due(&self, user: UserId, limit: usize) -> StoreResult<Vec<VocabularyItem>> {
        self.due_at(user, limit, Utc::now().date_naive()).await
    }

    /// Due words as of an explicit day.
    ///
    /// # Errors
    /// Returns an error if the document cannot be loaded.
    pub async fn due_at(
        &self,
        user: UserId,
        limit: usize,
        today: NaiveDate,
    ) -> StoreResult<Vec<VocabularyItem>> {
        let lock = self.user_lock(user);
        let _guard = lock.lock().await;
        self.load_into_cache(user).await?;

        let Some(book) = self.books.get(&user) else {
            return Ok(Vec::new());
        };

        let mut due: Vec<VocabularyItem> = book
            .words
            .iter()
            .filter(|item| item.is_due(today))
            .cloned()
            .collect();
        due.sort_by_key(|item| item.next_review);
        due.truncate(limit);
        Ok(due)
    }

    /// Remove a word (case-insensitive). Returns whether a word was
    /// actually removed.
    ///
    /// # Errors
    /// Returns an error if the document cannot be loaded or saved.
    pub async fn delete(&self, user: UserId, word: &str) -> StoreResult<bool> {
        let lock = self.user_lock(user);
        let _guard = lock.lock().await;
        self.load_into_cache(user).await?;

        let removed = {
            let Some(mut book) = self.books.get_mut(&user) else {
                return Ok(false);
            };
            match book.position(word) {
                Some(index) => {
                    book.words.remove(index);
                    true
                }
                None => false,
            }
        };

        if removed {
            self.persist(user).await?;
            info!(%user, word, "Deleted vocabulary word");
        }
        Ok(removed)
    }

    /// Counts by status plus the size of the due set.
    ///
    /// # Errors
    /// Returns an error if the document cannot be loaded.
    pub async fn stats(&self, user: UserId) -> StoreResult<VocabularyStats> {
        self.stats_at(user, Utc::now().date_naive()).await
    }

    /// Statistics as of an explicit day.
    ///
    /// # Errors
    /// Returns an error if the document cannot be loaded.
    pub async fn stats_at(&self, user: UserId, today: NaiveDate) -> StoreResult<VocabularyStats> {
        let lock = self.user_lock(user);
        let _guard = lock.lock().await;
        self.load_into_cache(user).await?;

        let Some(book) = self.books.get(&user) else {
            return Ok(VocabularyStats::default());
        };

        let mut stats = VocabularyStats {
            total: book.words.len(),
            ..VocabularyStats::default()
        };
        for item in &book.words {
            match item.status {
                WordStatus::New => stats.new += 1,
                WordStatus::Learning => stats.learning += 1,
                WordStatus::Mastered => stats.mastered += 1,
            }
            if item.is_due(today) {
                stats.due_today += 1;
            }
        }
        Ok(stats)
    }
}
