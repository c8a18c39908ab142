//! Streak and heatmap aggregation over the activity log.
//!
//! Both are recomputed from the full history each time; nothing incremental is
//! kept, so the output only depends on the logs passed in (and, for streaks, on
//! which day counts as today).

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ActivityLog, ActivityType};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakStats {
    pub current_streak: u32,
    pub longest_streak: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapDetails {
    pub tasks_completed: u32,
    pub flashcards_new: u32,
    pub flashcards_reviewed: u32,
}

/// Activity totals for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapBucket {
    pub date: String,
    pub count: u32,
    pub details: HeatmapDetails,
}

/// Streaks as of today (UTC).
pub fn calculate_streak(logs: &[ActivityLog]) -> StreakStats {
    calculate_streak_on(logs, Utc::now().date_naive())
}

/// Streaks as of `today`.
///
/// The current streak is the run of consecutive days ending at the most recent
/// active day, counted only if that day is `today` or the day before.
pub fn calculate_streak_on(logs: &[ActivityLog], today: NaiveDate) -> StreakStats {
    let days: BTreeSet<NaiveDate> = logs
        .iter()
        .filter_map(|entry| {
            let day = entry.day();
            if day.is_none() {
                log::warn!("Ignoring activity {} with malformed date {:?}", entry.id, entry.date);
            }
            day
        })
        .collect();

    let Some(&last) = days.iter().next_back() else {
        return StreakStats::default();
    };

    let mut longest = 0;
    let mut run = 0;
    let mut prev: Option<NaiveDate> = None;
    for &day in &days {
        run = match prev {
            Some(p) if day - p == Duration::days(1) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(day);
    }

    let current = if last == today || last == today - Duration::days(1) { run } else { 0 };

    StreakStats { current_streak: current, longest_streak: longest }
}

/// Per-day activity buckets, in ascending date order.
pub fn aggregate_heatmap_data(logs: &[ActivityLog]) -> Vec<HeatmapBucket> {
    let mut buckets: BTreeMap<&str, HeatmapBucket> = BTreeMap::new();

    for log in logs {
        let bucket = buckets.entry(log.date.as_str()).or_insert_with(|| HeatmapBucket {
            date: log.date.clone(),
            count: 0,
            details: HeatmapDetails::default(),
        });

        bucket.count += 1;
        match log.activity_type {
            ActivityType::TaskComplete => bucket.details.tasks_completed += 1,
            ActivityType::FlashcardReview if log.is_new_card() => bucket.details.flashcards_new += 1,
            ActivityType::FlashcardReview => bucket.details.flashcards_reviewed += 1,
            ActivityType::NoteCreated | ActivityType::StreakMaintained => {}
        }
    }

    buckets.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn log_on(date: NaiveDate, activity_type: ActivityType) -> ActivityLog {
        let mut log = ActivityLog::new(activity_type, None, 1, None);
        log.date = date.format("%Y-%m-%d").to_string();
        log
    }

    fn logs_on(today: NaiveDate, offsets: &[i64]) -> Vec<ActivityLog> {
        offsets
            .iter()
            .map(|o| log_on(today - Duration::days(*o), ActivityType::TaskComplete))
            .collect()
    }

    #[test]
    fn test_empty_logs() {
        assert_eq!(calculate_streak_on(&[], day("2024-05-10")), StreakStats::default());
        assert!(aggregate_heatmap_data(&[]).is_empty());
    }

    #[test]
    fn test_streak_ending_today() {
        let today = day("2024-05-10");
        let stats = calculate_streak_on(&logs_on(today, &[3, 2, 1, 0]), today);
        assert_eq!(stats, StreakStats { current_streak: 4, longest_streak: 4 });
    }

    #[test]
    fn test_streak_ending_yesterday_still_counts() {
        let today = day("2024-05-10");
        let stats = calculate_streak_on(&logs_on(today, &[2, 1]), today);
        assert_eq!(stats.current_streak, 2);
    }

    #[test]
    fn test_gap_breaks_streak() {
        let today = day("2024-05-10");
        let stats = calculate_streak_on(&logs_on(today, &[5, 3]), today);
        assert_eq!(stats, StreakStats { current_streak: 0, longest_streak: 1 });
    }

    #[test]
    fn test_current_is_trailing_run_not_longest() {
        let today = day("2024-05-10");
        let stats = calculate_streak_on(&logs_on(today, &[10, 9, 8, 7, 1, 0]), today);
        assert_eq!(stats, StreakStats { current_streak: 2, longest_streak: 4 });
    }

    #[test]
    fn test_duplicate_days_and_order_do_not_matter() {
        let today = day("2024-05-10");
        let stats = calculate_streak_on(&logs_on(today, &[0, 1, 0, 2, 1]), today);
        assert_eq!(stats, StreakStats { current_streak: 3, longest_streak: 3 });
    }

    #[test]
    fn test_streak_across_month_boundary() {
        let today = day("2024-03-01");
        let logs = vec![
            log_on(day("2024-02-28"), ActivityType::NoteCreated),
            log_on(day("2024-02-29"), ActivityType::NoteCreated),
            log_on(day("2024-03-01"), ActivityType::NoteCreated),
        ];
        assert_eq!(calculate_streak_on(&logs, today).current_streak, 3);
    }

    #[test]
    fn test_malformed_dates_are_ignored() {
        let today = day("2024-05-10");
        let mut logs = logs_on(today, &[0]);
        let mut bad = log_on(today, ActivityType::TaskComplete);
        bad.date = "yesterday".to_string();
        logs.push(bad);
        assert_eq!(calculate_streak_on(&logs, today).longest_streak, 1);
    }

    #[test]
    fn test_heatmap_bucket_breakdown() {
        let d = day("2024-05-10");
        let mut new_review = log_on(d, ActivityType::FlashcardReview);
        new_review.metadata = Some(json!({"isNew": true}));
        let logs = vec![
            log_on(d, ActivityType::TaskComplete),
            log_on(d, ActivityType::TaskComplete),
            log_on(d, ActivityType::FlashcardReview),
            log_on(day("2024-05-09"), ActivityType::NoteCreated),
        ];

        let buckets = aggregate_heatmap_data(&logs);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].date, "2024-05-09");
        assert_eq!(buckets[0].count, 1);
        assert_eq!(buckets[0].details, HeatmapDetails::default());

        let today = &buckets[1];
        assert_eq!(today.count, 3);
        assert_eq!(today.details.tasks_completed, 2);
        assert_eq!(today.details.flashcards_reviewed, 1);
        assert_eq!(today.details.flashcards_new, 0);

        let mut with_new = logs.clone();
        with_new.push(new_review);
        let buckets = aggregate_heatmap_data(&with_new);
        assert_eq!(buckets[1].count, 4);
        assert_eq!(buckets[1].details.flashcards_new, 1);
    }
}
