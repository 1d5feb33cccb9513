//! Analytics aggregator: the single writer for per-user activity documents.

use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::gateway::CorrectionReport;
use crate::ids::UserId;
use crate::storage::{DocumentStore, StoreResult};

use super::classify::ReportClassifier;
use super::types::{AnalyticsProfile, AnalyticsSnapshot, ChartWindow, DayActivityPoint, MessageKind};

/// Aggregates message and error events into per-user analytics documents.
///
/// Mutations are atomic per user: each read-modify-write runs under that
/// user's lock, and the whole document is persisted write-through.
/// Readers always receive copies.
pub struct AnalyticsAggregator {
    store: Arc<dyn DocumentStore>,
    classifier: ReportClassifier,
    profiles: DashMap<UserId, AnalyticsProfile>,
    locks: DashMap<UserId, Arc<Mutex<()>>>,
}

impl AnalyticsAggregator {
    /// Create an aggregator writing through to the given store.
    ///
    /// # Errors
    /// Returns an error if the report classifier fails to build.
    pub fn new(store: Arc<dyn DocumentStore>) -> Result<Self, regex::Error> {
        Ok(Self {
            store,
            classifier: ReportClassifier::new()?,
            profiles: DashMap::new(),
            locks: DashMap::new(),
        })
    }

    fn user_lock(&self, user: UserId) -> Arc<Mutex<()>> {
        self.locks.entry(user).or_default().clone()
    }

    /// Pull the user's document into the cache if it is not there yet.
    async fn load_into_cache(&self, user: UserId) -> StoreResult<()> {
        if self.profiles.contains_key(&user) {
            return Ok(());
        }
        if let Some(json) = self.store.load(user).await? {
            let profile: AnalyticsProfile = serde_json::from_str(&json)?;
            self.profiles.insert(user, profile);
            debug!(%user, "Loaded analytics document");
        }
        Ok(())
    }

    /// Track one message.
    ///
    /// # Errors
    /// Returns an error if the document cannot be loaded or saved.
    pub async fn record_message(&self, user: UserId, kind: MessageKind) -> StoreResult<()> {
        self.record_message_at(user, kind, Utc::now()).await
    }

    /// Track one message as of an explicit clock value.
    ///
    /// # Errors
    /// Returns an error if the document cannot be loaded or saved.
    pub async fn record_message_at(
        &self,
        user: UserId,
        kind: MessageKind,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let lock = self.user_lock(user);
        let _guard = lock.lock().await;
        self.load_into_cache(user).await?;

        let today = now.date_naive();
        let doc = {
            let mut entry = self.profiles.entry(user).or_default();
            let profile = entry.value_mut();

            profile.total_messages += 1;
            match kind {
                MessageKind::Voice => profile.voice_messages += 1,
                MessageKind::Text => profile.text_messages += 1,
            }

            profile.daily_activity.entry(today).or_default().messages += 1;

            // First event of a new calendar day extends the practice-day
            // set and refreshes the stored streak.
            if profile.practice_days.insert(today) {
                profile.streak = profile.streak_as_of(today);
            }
            profile.last_activity = Some(now);

            serde_json::to_string(profile)?
        };

        self.store.save(user, doc).await?;
        info!(%user, %kind, "Tracked message");
        Ok(())
    }

    /// Track the findings of one correction report. Clean reports are a
    /// no-op. Returns the number of findings counted.
    ///
    /// # Errors
    /// Returns an error if the document cannot be loaded or saved.
    pub async fn record_errors(&self, user: UserId, report: &str) -> StoreResult<u32> {
        self.record_errors_at(user, report, Utc::now()).await
    }

    /// Track one correction report as of an explicit clock value.
    ///
    /// # Errors
    /// Returns an error if the document cannot be loaded or saved.
    pub async fn record_errors_at(
        &self,
        user: UserId,
        report: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<u32> {
        let report = report.trim();
        if report.is_empty() || report == CorrectionReport::CLEAN_MARKER {
            return Ok(0);
        }

        let lock = self.user_lock(user);
        let _guard = lock.lock().await;
        self.load_into_cache(user).await?;

        let today = now.date_naive();
        let count = self.classifier.count_findings(report);
        let categories = self.classifier.classify(report);

        let doc = {
            let mut entry = self.profiles.entry(user).or_default();
            let profile = entry.value_mut();

            profile.total_errors += u64::from(count);
            profile.daily_activity.entry(today).or_default().errors += count;
            for category in categories {
                *profile.error_types.entry(category).or_insert(0) += 1;
            }

            serde_json::to_string(profile)?
        };

        self.store.save(user, doc).await?;
        info!(%user, count, "Tracked grammar findings");
        Ok(count)
    }

    /// Read a user's analytics with derived values computed as of now.
    ///
    /// # Errors
    /// Returns an error if the document cannot be loaded.
    pub async fn profile(&self, user: UserId) -> StoreResult<Option<AnalyticsSnapshot>> {
        self.profile_at(user, Utc::now().date_naive()).await
    }

    /// Read a user's analytics as of an explicit day.
    ///
    /// # Errors
    /// Returns an error if the document cannot be loaded.
    pub async fn profile_at(
        &self,
        user: UserId,
        today: NaiveDate,
    ) -> StoreResult<Option<AnalyticsSnapshot>> {
        let lock = self.user_lock(user);
        let _guard = lock.lock().await;
        self.load_into_cache(user).await?;

        let Some(stored) = self.profiles.get(&user) else {
            return Ok(None);
        };
        let mut profile = stored.clone();
        drop(stored);

        // The streak is always evaluated against the current day, never
        // trusted from the last mutation.
        profile.streak = profile.streak_as_of(today);
        let error_rate = profile.error_rate();
        let messages_this_week = profile.messages_this_week(today);

        Ok(Some(AnalyticsSnapshot {
            profile,
            error_rate,
            messages_this_week,
        }))
    }

    /// Daily series for the trailing `days` days, oldest first, zero-filled.
    ///
    /// # Errors
    /// Returns an error if the document cannot be loaded.
    pub async fn chart_window(&self, user: UserId, days: usize) -> StoreResult<ChartWindow> {
        self.chart_window_at(user, days, Utc::now().date_naive())
            .await
    }

    /// Daily series as of an explicit day.
    ///
    /// # Errors
    /// Returns an error if the document cannot be loaded.
    pub async fn chart_window_at(
        &self,
        user: UserId,
        days: usize,
        today: NaiveDate,
    ) -> StoreResult<ChartWindow> {
        let lock = self.user_lock(user);
        let _guard = lock.lock().await;
        self.load_into_cache(user).await?;

        let Some(profile) = self.profiles.get(&user) else {
            return Ok(ChartWindow::default());
        };

        let mut daily = Vec::with_capacity(days);
        for offset in (0..days).rev() {
            let date = today - Days::new(offset as u64);
            let activity = profile.daily_activity.get(&date).copied().unwrap_or_default();
            daily.push(DayActivityPoint {
                date,
                messages: activity.messages,
                errors: activity.errors,
            });
        }

        Ok(ChartWindow {
            daily,
            error_types: profile.error_types.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::classify::ErrorCategory;
    use crate::storage::MemoryDocumentStore;

    fn aggregator() -> (AnalyticsAggregator, Arc<MemoryDocumentStore>) {
        let store = Arc::new(MemoryDocumentStore::new());
        let aggregator = AnalyticsAggregator::new(Arc::clone(&store) as Arc<dyn DocumentStore>)
            .unwrap();
        (aggregator, store)
    }

    fn at(day: &str) -> DateTime<Utc> {
        day.parse::<NaiveDate>()
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
            .and_utc()
    }

    fn date(day: &str) -> NaiveDate {
        day.parse().unwrap()
    }

    #[tokio::test]
    async fn test_record_message_counters() {
        let (aggregator, _) = aggregator();
        let user = UserId::new(1);

        aggregator
            .record_message_at(user, MessageKind::Voice, at("2026-08-07"))
            .await
            .unwrap();
        aggregator
            .record_message_at(user, MessageKind::Text, at("2026-08-07"))
            .await
            .unwrap();

        let snapshot = aggregator
            .profile_at(user, date("2026-08-07"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.profile.total_messages, 2);
        assert_eq!(snapshot.profile.voice_messages, 1);
        assert_eq!(snapshot.profile.text_messages, 1);
        assert_eq!(
            snapshot
                .profile
                .daily_activity
                .get(&date("2026-08-07"))
                .unwrap()
                .messages,
            2
        );
        assert_eq!(snapshot.profile.practice_days.len(), 1);
        assert_eq!(snapshot.profile.streak, 1);
        assert!(snapshot.profile.last_activity.is_some());
    }

    #[tokio::test]
    async fn test_streak_consecutive_days() {
        let (aggregator, _) = aggregator();
        let user = UserId::new(2);

        for day in ["2026-08-05", "2026-08-06", "2026-08-07"] {
            aggregator
                .record_message_at(user, MessageKind::Text, at(day))
                .await
                .unwrap();
        }

        let snapshot = aggregator
            .profile_at(user, date("2026-08-07"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.profile.streak, 3);
    }

    #[tokio::test]
    async fn test_streak_broken_by_gap() {
        let (aggregator, _) = aggregator();
        let user = UserId::new(3);

        // Three messages on day D, two on D+1, none on D+2, one on D+3.
        for _ in 0..3 {
            aggregator
                .record_message_at(user, MessageKind::Text, at("2026-08-01"))
                .await
                .unwrap();
        }
        for _ in 0..2 {
            aggregator
                .record_message_at(user, MessageKind::Text, at("2026-08-02"))
                .await
                .unwrap();
        }
        aggregator
            .record_message_at(user, MessageKind::Text, at("2026-08-04"))
            .await
            .unwrap();

        let snapshot = aggregator
            .profile_at(user, date("2026-08-04"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.profile.streak, 1);
        assert_eq!(snapshot.profile.total_messages, 6);
    }

    #[tokio::test]
    async fn test_streak_recomputed_on_read() {
        let (aggregator, _) = aggregator();
        let user = UserId::new(4);

        aggregator
            .record_message_at(user, MessageKind::Text, at("2026-08-07"))
            .await
            .unwrap();

        // The day after with no new activity, the read reports 0 even
        // though the stored value was 1.
        let snapshot = aggregator
            .profile_at(user, date("2026-08-08"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.profile.streak, 0);
    }

    #[tokio::test]
    async fn test_record_errors_categories_and_count() {
        let (aggregator, _) = aggregator();
        let user = UserId::new(5);
        let now = at("2026-08-07");

        aggregator
            .record_message_at(user, MessageKind::Text, now)
            .await
            .unwrap();
        let report = "1. Ошибка: неправильное время глагола Правильно: I went\n\
                      2. Ошибка: пропущен артикль Правильно: a cat";
        let counted = aggregator.record_errors_at(user, report, now).await.unwrap();
        assert_eq!(counted, 2);

        let snapshot = aggregator
            .profile_at(user, date("2026-08-07"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.profile.total_errors, 2);
        assert_eq!(
            snapshot.profile.error_types.get(&ErrorCategory::VerbTense),
            Some(&1)
        );
        assert_eq!(
            snapshot.profile.error_types.get(&ErrorCategory::Articles),
            Some(&1)
        );
        assert_eq!(
            snapshot
                .profile
                .daily_activity
                .get(&date("2026-08-07"))
                .unwrap()
                .errors,
            2
        );
        // 2 errors / 1 message = 200.0
        assert_eq!(snapshot.error_rate, 200.0);
    }

    #[tokio::test]
    async fn test_clean_report_is_noop() {
        let (aggregator, _) = aggregator();
        let user = UserId::new(6);

        let counted = aggregator
            .record_errors_at(user, "No errors found.", at("2026-08-07"))
            .await
            .unwrap();
        assert_eq!(counted, 0);
        assert!(aggregator
            .profile_at(user, date("2026-08-07"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_unknown_user_reads() {
        let (aggregator, _) = aggregator();
        let user = UserId::new(7);

        assert!(aggregator
            .profile_at(user, date("2026-08-07"))
            .await
            .unwrap()
            .is_none());
        let window = aggregator
            .chart_window_at(user, 7, date("2026-08-07"))
            .await
            .unwrap();
        assert!(window.daily.is_empty());
    }

    #[tokio::test]
    async fn test_chart_window_zero_filled() {
        let (aggregator, _) = aggregator();
        let user = UserId::new(8);

        aggregator
            .record_message_at(user, MessageKind::Text, at("2026-08-05"))
            .await
            .unwrap();
        aggregator
            .record_message_at(user, MessageKind::Text, at("2026-08-07"))
            .await
            .unwrap();

        let window = aggregator
            .chart_window_at(user, 3, date("2026-08-07"))
            .await
            .unwrap();
        assert_eq!(window.daily.len(), 3);
        assert_eq!(window.daily[0].date, date("2026-08-05"));
        assert_eq!(window.daily[0].messages, 1);
        assert_eq!(window.daily[1].messages, 0);
        assert_eq!(window.daily[2].date, date("2026-08-07"));
        assert_eq!(window.daily[2].messages, 1);
    }

    #[tokio::test]
    async fn test_write_through_persistence() {
        let store = Arc::new(MemoryDocumentStore::new());
        let user = UserId::new(9);

        {
            let aggregator =
                AnalyticsAggregator::new(Arc::clone(&store) as Arc<dyn DocumentStore>).unwrap();
            aggregator
                .record_message_at(user, MessageKind::Voice, at("2026-08-07"))
                .await
                .unwrap();
        }

        // A fresh aggregator over the same store sees the document.
        let aggregator =
            AnalyticsAggregator::new(Arc::clone(&store) as Arc<dyn DocumentStore>).unwrap();
        let snapshot = aggregator
            .profile_at(user, date("2026-08-07"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.profile.voice_messages, 1);
    }
}
