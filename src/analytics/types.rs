//! Analytics data model: per-user counters and derived statistics.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::classify::ErrorCategory;

/// Kind of a tracked message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Spoken message, transcribed before processing.
    Voice,
    /// Typed message.
    Text,
}

impl MessageKind {
    /// Stable wire name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Voice => "voice",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters for one calendar day. Counts only ever grow within a day.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct DailyActivity {
    /// Messages sent that day.
    pub messages: u32,
    /// Grammar findings recorded that day.
    pub errors: u32,
}

/// Persisted per-user analytics document.
///
/// Derived values (error rate, weekly totals, as-of-now streak) are never
/// stored; they are recomputed from these counters on every read.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AnalyticsProfile {
    /// All messages ever tracked.
    pub total_messages: u64,
    /// Voice messages tracked.
    pub voice_messages: u64,
    /// Text messages tracked.
    pub text_messages: u64,
    /// Grammar findings tracked.
    pub total_errors: u64,
    /// Reports per error category.
    pub error_types: BTreeMap<ErrorCategory, u64>,
    /// Every calendar day with at least one tracked message.
    pub practice_days: BTreeSet<NaiveDate>,
    /// Streak as of the last mutation. Reads recompute it; see
    /// [`AnalyticsProfile::streak_as_of`].
    pub streak: u32,
    /// Activity per calendar day, keyed by ISO date.
    pub daily_activity: BTreeMap<NaiveDate, DailyActivity>,
    /// Timestamp of the last tracked event.
    pub last_activity: Option<DateTime<Utc>>,
}

impl AnalyticsProfile {
    /// Errors per hundred messages, rounded to one decimal place.
    /// `0.0` when no messages have been tracked.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn error_rate(&self) -> f64 {
        if self.total_messages == 0 {
            return 0.0;
        }
        let rate = self.total_errors as f64 / self.total_messages as f64 * 100.0;
        (rate * 10.0).round() / 10.0
    }

    /// Messages over the trailing seven days, inclusive of `today`.
    #[must_use]
    pub fn messages_this_week(&self, today: NaiveDate) -> u64 {
        let window_start = today - Days::new(6);
        self.daily_activity
            .range(window_start..=today)
            .map(|(_, activity)| u64::from(activity.messages))
            .sum()
    }

    /// Consecutive practice days ending at `today`, walking backward until
    /// the first gap. Always recomputed, never trusted from storage.
    #[must_use]
    pub fn streak_as_of(&self, today: NaiveDate) -> u32 {
        let mut streak = 0;
        let mut cursor = today;
        while self.practice_days.contains(&cursor) {
            streak += 1;
            let Some(previous) = cursor.pred_opt() else {
                break;
            };
            cursor = previous;
        }
        streak
    }
}

/// Read view of a user's analytics: the stored counters plus the derived
/// values, computed at read time.
#[derive(Clone, Debug, Serialize)]
pub struct AnalyticsSnapshot {
    /// Stored counters, with `streak` refreshed as of the read.
    #[serde(flatten)]
    pub profile: AnalyticsProfile,
    /// Errors per hundred messages, one decimal place.
    pub error_rate: f64,
    /// Messages over the trailing seven days.
    pub messages_this_week: u64,
}

/// One day of a chart window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DayActivityPoint {
    /// Calendar day.
    pub date: NaiveDate,
    /// Messages that day.
    pub messages: u32,
    /// Findings that day.
    pub errors: u32,
}

/// Daily series for charting, oldest day first, zero-filled.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ChartWindow {
    /// One point per requested day.
    pub daily: Vec<DayActivityPoint>,
    /// Full error-type distribution.
    pub error_types: BTreeMap<ErrorCategory, u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_error_rate_zero_messages() {
        let profile = AnalyticsProfile::default();
        assert_eq!(profile.error_rate(), 0.0);
    }

    #[test]
    fn test_error_rate_rounding() {
        let profile = AnalyticsProfile {
            total_messages: 3,
            total_errors: 1,
            ..AnalyticsProfile::default()
        };
        // 1/3 * 100 = 33.33... -> 33.3
        assert_eq!(profile.error_rate(), 33.3);

        let profile = AnalyticsProfile {
            total_messages: 8,
            total_errors: 3,
            ..AnalyticsProfile::default()
        };
        // 37.5 stays 37.5
        assert_eq!(profile.error_rate(), 37.5);
    }

    #[test]
    fn test_messages_this_week_window() {
        let mut profile = AnalyticsProfile::default();
        let today = date("2026-08-07");
        // Inside the window: today and today-6.
        profile.daily_activity.insert(
            today,
            DailyActivity {
                messages: 2,
                errors: 0,
            },
        );
        profile.daily_activity.insert(
            date("2026-08-01"),
            DailyActivity {
                messages: 3,
                errors: 0,
            },
        );
        // Outside: today-7.
        profile.daily_activity.insert(
            date("2026-07-31"),
            DailyActivity {
                messages: 10,
                errors: 0,
            },
        );
        assert_eq!(profile.messages_this_week(today), 5);
    }

    #[test]
    fn test_streak_empty() {
        let profile = AnalyticsProfile::default();
        assert_eq!(profile.streak_as_of(date("2026-08-07")), 0);
    }

    #[test]
    fn test_streak_trailing_run() {
        let mut profile = AnalyticsProfile::default();
        for day in ["2026-08-05", "2026-08-06", "2026-08-07"] {
            profile.practice_days.insert(date(day));
        }
        assert_eq!(profile.streak_as_of(date("2026-08-07")), 3);
        // Evaluated the next day without new activity, the run is broken.
        assert_eq!(profile.streak_as_of(date("2026-08-08")), 0);
    }

    #[test]
    fn test_streak_stops_at_gap() {
        let mut profile = AnalyticsProfile::default();
        for day in ["2026-08-03", "2026-08-04", "2026-08-06", "2026-08-07"] {
            profile.practice_days.insert(date(day));
        }
        assert_eq!(profile.streak_as_of(date("2026-08-07")), 2);
    }

    #[test]
    fn test_profile_json_roundtrip() {
        let mut profile = AnalyticsProfile {
            total_messages: 4,
            voice_messages: 1,
            text_messages: 3,
            total_errors: 2,
            ..AnalyticsProfile::default()
        };
        profile.practice_days.insert(date("2026-08-07"));
        profile.daily_activity.insert(
            date("2026-08-07"),
            DailyActivity {
                messages: 4,
                errors: 2,
            },
        );
        profile
            .error_types
            .insert(ErrorCategory::Articles, 1);

        let json = serde_json::to_string(&profile).unwrap();
        assert!(json.contains("\"2026-08-07\""));
        let restored: AnalyticsProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.total_messages, 4);
        assert_eq!(restored.daily_activity.len(), 1);
        assert_eq!(restored.error_types.get(&ErrorCategory::Articles), Some(&1));
    }
}
