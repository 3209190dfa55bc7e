//! Persisted practice statistics: lesson progress, session history, and the
//! per-character error heatmap.

use crate::metrics::{self, SessionResult};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// Number of sessions kept in the rolling history
pub const HISTORY_LIMIT: usize = 50;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    #[default]
    Typing,
    Lesson,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionEntry {
    pub date: DateTime<Utc>,
    pub wpm: u32,
    pub accuracy: u32,
    pub category: String,
    #[serde(rename = "duration")]
    pub duration_seconds: u64,
    #[serde(rename = "type", default)]
    pub kind: SessionKind,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProblemKey {
    pub key: char,
    pub errors: u32,
    pub attempts: u32,
    pub rate: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserStatistics {
    pub completed_lessons: BTreeSet<u32>,
    pub lesson_stars: BTreeMap<u32, u8>,
    #[serde(rename = "bestWPM")]
    pub best_wpm: u32,
    pub sessions_count: u32,
    pub session_history: Vec<SessionEntry>,
    /// Seconds
    pub total_practice_time: u64,
    #[serde(rename = "averageWPM")]
    pub average_wpm: u32,
    pub average_accuracy: u32,
    pub error_counts: BTreeMap<char, u32>,
    #[serde(rename = "totalKeyPresses")]
    pub attempt_counts: BTreeMap<char, u32>,
}

fn heatmap_key(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

impl UserStatistics {
    /// Fold a finished session into the aggregate. The caller persists.
    pub fn finalize_session(
        &mut self,
        result: &SessionResult,
        category: &str,
        kind: SessionKind,
        date: DateTime<Utc>,
    ) {
        self.best_wpm = self.best_wpm.max(result.wpm);
        self.sessions_count += 1;

        self.session_history.push(SessionEntry {
            date,
            wpm: result.wpm,
            accuracy: result.accuracy,
            category: category.to_string(),
            duration_seconds: result.duration_seconds,
            kind,
        });
        if self.session_history.len() > HISTORY_LIMIT {
            let excess = self.session_history.len() - HISTORY_LIMIT;
            self.session_history.drain(..excess);
        }

        self.total_practice_time += result.duration_seconds;
        self.update_averages();

        info!(
            wpm = result.wpm,
            accuracy = result.accuracy,
            category,
            sessions = self.sessions_count,
            "session finalized"
        );
    }

    /// Averages cover the retained history only, not every session ever run
    fn update_averages(&mut self) {
        let wpms: Vec<f64> = self.session_history.iter().map(|s| s.wpm as f64).collect();
        let accs: Vec<f64> = self
            .session_history
            .iter()
            .map(|s| s.accuracy as f64)
            .collect();
        self.average_wpm = metrics::mean(&wpms).map_or(0, |m| m.round() as u32);
        self.average_accuracy = metrics::mean(&accs).map_or(0, |m| m.round() as u32);
    }

    /// Mark a lesson complete and keep its best star rating
    pub fn record_lesson(&mut self, lesson_id: u32, stars: Option<u8>) {
        self.completed_lessons.insert(lesson_id);
        if let Some(stars) = stars {
            let best = self.lesson_stars.entry(lesson_id).or_insert(stars);
            *best = (*best).max(stars);
        }
    }

    pub fn stars_for(&self, lesson_id: u32) -> u8 {
        self.lesson_stars.get(&lesson_id).copied().unwrap_or(0)
    }

    pub fn is_completed(&self, lesson_id: u32) -> bool {
        self.completed_lessons.contains(&lesson_id)
    }

    pub fn completed_count(&self) -> usize {
        self.completed_lessons.len()
    }

    pub fn record_attempt(&mut self, expected: char) {
        *self.attempt_counts.entry(heatmap_key(expected)).or_insert(0) += 1;
    }

    pub fn record_error(&mut self, expected: char) {
        *self.error_counts.entry(heatmap_key(expected)).or_insert(0) += 1;
    }

    pub fn errors_for(&self, c: char) -> u32 {
        self.error_counts.get(&heatmap_key(c)).copied().unwrap_or(0)
    }

    pub fn attempts_for(&self, c: char) -> u32 {
        self.attempt_counts.get(&heatmap_key(c)).copied().unwrap_or(0)
    }

    pub fn error_rate(&self, c: char) -> f64 {
        match self.attempts_for(c) {
            0 => 0.0,
            attempts => self.errors_for(c) as f64 / attempts as f64,
        }
    }

    pub fn max_errors(&self) -> u32 {
        self.error_counts.values().copied().max().unwrap_or(0)
    }

    /// Characters with the most errors first (raw count, not rate)
    pub fn top_problem_keys(&self, limit: usize) -> Vec<ProblemKey> {
        self.error_counts
            .iter()
            .filter(|(_, errors)| **errors > 0)
            .map(|(&key, &errors)| {
                let attempts = self.attempts_for(key);
                ProblemKey {
                    key,
                    errors,
                    attempts,
                    rate: if attempts > 0 {
                        errors as f64 / attempts as f64
                    } else {
                        0.0
                    },
                }
            })
            .sorted_by(|a, b| b.errors.cmp(&a.errors).then(a.key.cmp(&b.key)))
            .take(limit)
            .collect()
    }

    /// Newest first
    pub fn recent_sessions(&self, n: usize) -> Vec<&SessionEntry> {
        self.session_history.iter().rev().take(n).collect()
    }

    /// Mean WPM of the last five sessions minus the five before them
    pub fn wpm_trend(&self) -> i64 {
        let len = self.session_history.len();
        if len < 10 {
            return 0;
        }
        let avg = |entries: &[SessionEntry]| {
            entries.iter().map(|s| s.wpm as f64).sum::<f64>() / entries.len() as f64
        };
        let recent = avg(&self.session_history[len - 5..]);
        let previous = avg(&self.session_history[len - 10..len - 5]);
        (recent - previous).round() as i64
    }

    /// Spread of WPM over the retained history
    pub fn wpm_consistency(&self) -> Option<f64> {
        let wpms: Vec<f64> = self.session_history.iter().map(|s| s.wpm as f64).collect();
        metrics::std_dev(&wpms)
    }

    /// Restore invariants on data that came from disk
    pub fn sanitize(&mut self) {
        for (key, errors) in self.error_counts.iter_mut() {
            let attempts = self.attempt_counts.get(key).copied().unwrap_or(0);
            if *errors > attempts {
                *errors = attempts;
            }
        }
        self.error_counts.retain(|_, errors| *errors > 0);
        for stars in self.lesson_stars.values_mut() {
            *stars = (*stars).clamp(1, 5);
        }
        if self.session_history.len() > HISTORY_LIMIT {
            let excess = self.session_history.len() - HISTORY_LIMIT;
            self.session_history.drain(..excess);
            self.update_averages();
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn result(wpm: u32, accuracy: u32, duration_seconds: u64) -> SessionResult {
        SessionResult {
            wpm,
            accuracy,
            duration_seconds,
        }
    }

    fn date(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_finalize_session_updates_aggregate() {
        let mut stats = UserStatistics::default();
        stats.finalize_session(&result(40, 90, 30), "quotes", SessionKind::Typing, date(0));
        stats.finalize_session(&result(20, 100, 45), "code", SessionKind::Typing, date(60));

        assert_eq!(stats.best_wpm, 40);
        assert_eq!(stats.sessions_count, 2);
        assert_eq!(stats.total_practice_time, 75);
        assert_eq!(stats.average_wpm, 30);
        assert_eq!(stats.average_accuracy, 95);
        assert_eq!(stats.session_history.len(), 2);
        assert_eq!(stats.session_history[1].category, "code");
    }

    #[test]
    fn test_history_is_bounded_fifo() {
        let mut stats = UserStatistics::default();
        for i in 0..60u32 {
            stats.finalize_session(&result(i, 100, 1), "quotes", SessionKind::Typing, date(i as i64));
        }
        assert_eq!(stats.session_history.len(), HISTORY_LIMIT);
        assert_eq!(stats.session_history[0].wpm, 10);
        assert_eq!(stats.session_history.last().unwrap().wpm, 59);
        assert_eq!(stats.sessions_count, 60);
        assert_eq!(stats.total_practice_time, 60);
        // mean of 10..=59
        assert_eq!(stats.average_wpm, 35);
    }

    #[test]
    fn test_record_lesson_keeps_best_stars() {
        let mut stats = UserStatistics::default();
        stats.record_lesson(3, Some(4));
        stats.record_lesson(3, Some(2));
        stats.record_lesson(3, Some(5));
        stats.record_lesson(35, None);
        assert_eq!(stats.stars_for(3), 5);
        assert_eq!(stats.stars_for(35), 0);
        assert_eq!(stats.completed_count(), 2);
        assert!(stats.is_completed(35));
    }

    #[test]
    fn test_heatmap_counts_lowercase() {
        let mut stats = UserStatistics::default();
        stats.record_attempt('A');
        stats.record_attempt('a');
        stats.record_error('A');
        assert_eq!(stats.attempts_for('a'), 2);
        assert_eq!(stats.errors_for('a'), 1);
        assert_eq!(stats.error_rate('A'), 0.5);
        assert_eq!(stats.error_rate('z'), 0.0);
    }

    #[test]
    fn test_top_problem_keys_by_count() {
        let mut stats = UserStatistics::default();
        for (c, attempts, errors) in [('a', 100, 5), ('b', 2, 2), ('c', 10, 7), ('d', 3, 0)] {
            for _ in 0..attempts {
                stats.record_attempt(c);
            }
            for _ in 0..errors {
                stats.record_error(c);
            }
        }
        let top = stats.top_problem_keys(2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].key, 'c');
        assert_eq!(top[1].key, 'a');
        assert_eq!(top[1].errors, 5);
        assert_eq!(top[1].attempts, 100);
        assert!((top[0].rate - 0.7).abs() < 1e-9);
        assert_eq!(stats.max_errors(), 7);
    }

    #[test]
    fn test_wpm_trend() {
        let mut stats = UserStatistics::default();
        for _ in 0..5 {
            stats.finalize_session(&result(20, 100, 1), "q", SessionKind::Typing, date(0));
        }
        assert_eq!(stats.wpm_trend(), 0);
        for _ in 0..5 {
            stats.finalize_session(&result(30, 100, 1), "q", SessionKind::Typing, date(0));
        }
        assert_eq!(stats.wpm_trend(), 10);
    }

    #[test]
    fn test_recent_sessions_newest_first() {
        let mut stats = UserStatistics::default();
        for wpm in [10, 20, 30] {
            stats.finalize_session(&result(wpm, 100, 1), "q", SessionKind::Typing, date(0));
        }
        let recent: Vec<u32> = stats.recent_sessions(2).iter().map(|s| s.wpm).collect();
        assert_eq!(recent, vec![30, 20]);
    }

    #[test]
    fn test_sanitize_clamps_errors() {
        let mut stats = UserStatistics::default();
        stats.error_counts.insert('q', 9);
        stats.attempt_counts.insert('q', 4);
        stats.error_counts.insert('z', 3);
        stats.lesson_stars.insert(1, 9);
        stats.sanitize();
        assert_eq!(stats.errors_for('q'), 4);
        assert_eq!(stats.errors_for('z'), 0);
        assert!(!stats.error_counts.contains_key(&'z'));
        assert_eq!(stats.stars_for(1), 5);
    }

    #[test]
    fn test_sanitize_trims_history_and_averages() {
        let mut stats = UserStatistics::default();
        for i in 0..(HISTORY_LIMIT as i64 + 10) {
            let wpm = if i < 10 { 200 } else { 40 };
            stats.session_history.push(SessionEntry {
                date: date(i),
                wpm,
                accuracy: 90,
                category: "quotes".to_string(),
                duration_seconds: 30,
                kind: SessionKind::Typing,
            });
        }
        stats.average_wpm = 65;
        stats.average_accuracy = 12;

        stats.sanitize();
        assert_eq!(stats.session_history.len(), HISTORY_LIMIT);
        assert_eq!(stats.average_wpm, 40);
        assert_eq!(stats.average_accuracy, 90);
    }

    #[test]
    fn test_json_field_names() {
        let mut stats = UserStatistics::default();
        stats.record_attempt('a');
        stats.finalize_session(&result(25, 99, 12), "lesson-1", SessionKind::Lesson, date(0));
        let json = serde_json::to_value(&stats).unwrap();
        for field in [
            "completedLessons",
            "lessonStars",
            "bestWPM",
            "sessionsCount",
            "sessionHistory",
            "totalPracticeTime",
            "averageWPM",
            "averageAccuracy",
            "errorCounts",
            "totalKeyPresses",
        ] {
            assert!(json.get(field).is_some(), "missing {field}");
        }
        let entry = &json["sessionHistory"][0];
        assert_eq!(entry["duration"], 12);
        assert_eq!(entry["type"], "lesson");
    }

    #[test]
    fn test_partial_json_defaults() {
        let stats: UserStatistics =
            serde_json::from_str(r#"{"bestWPM": 42, "completedLessons": [1, 2, 2]}"#).unwrap();
        assert_eq!(stats.best_wpm, 42);
        assert_eq!(stats.completed_count(), 2);
        assert!(stats.session_history.is_empty());
    }

    #[test]
    fn test_reset() {
        let mut stats = UserStatistics::default();
        stats.record_lesson(1, Some(3));
        stats.record_attempt('x');
        stats.reset();
        assert_eq!(stats, UserStatistics::default());
    }
}
