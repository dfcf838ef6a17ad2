use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type TaskId = String;

/// Occurrence count per error tag, ordered by tag.
pub type ErrorTagCounts = BTreeMap<String, usize>;

pub const DEFAULT_EASINESS: f64 = 2.5;
pub const MIN_EASINESS: f64 = 1.3;

/// Recent performance snapshot supplied with each decision call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
    pub level: i32,
    pub correct: i32,
    pub attempts: i32,
}

impl Performance {
    pub fn new(level: i32, correct: i32, attempts: i32) -> Self {
        Self { level, correct, attempts }
    }

    /// Fraction of correct attempts; zero when there is no evidence.
    pub fn accuracy(&self) -> f64 {
        if self.attempts <= 0 {
            return 0.0;
        }
        self.correct.max(0) as f64 / self.attempts as f64
    }
}

/// One completed attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub task_id: TaskId,
    pub score: f64,
    pub timestamp: DateTime<Utc>,
}

impl HistoryItem {
    pub fn new(task_id: impl Into<TaskId>, score: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            task_id: task_id.into(),
            score,
            timestamp,
        }
    }
}

/// A review item tracked by spaced repetition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drill {
    pub id: TaskId,
    pub interval_days: u32,
    pub repetition_count: u32,
    pub easiness_factor: f64,
    pub due_at: DateTime<Utc>,
    #[serde(default)]
    pub mastered: bool,
}

impl Drill {
    /// A freshly enrolled item, due immediately.
    pub fn new(id: impl Into<TaskId>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            interval_days: 1,
            repetition_count: 0,
            easiness_factor: DEFAULT_EASINESS,
            due_at: now,
            mastered: false,
        }
    }
}

/// Output of the continuous interval model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalStep {
    pub next_days: u32,
    pub next_easiness: f64,
}

/// One grading transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleReviewInput {
    #[serde(default)]
    pub easiness: Option<f64>,
    pub interval_days: f64,
    pub quality: u8,
    #[serde(default)]
    pub repetitions: Option<u32>,
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
}

impl ScheduleReviewInput {
    pub fn new(easiness: f64, interval_days: f64, quality: u8) -> Self {
        Self {
            easiness: Some(easiness),
            interval_days,
            quality,
            repetitions: None,
            now: None,
        }
    }

    pub fn with_repetitions(mut self, repetitions: u32) -> Self {
        self.repetitions = Some(repetitions);
        self
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleReviewResult {
    pub next_interval_days: u32,
    pub next_easiness: f64,
    pub next_due_at: DateTime<Utc>,
    pub mastered: bool,
    pub repetitions: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_without_attempts_is_zero() {
        assert_eq!(Performance::new(3, 0, 0).accuracy(), 0.0);
        assert_eq!(Performance::new(3, 2, -4).accuracy(), 0.0);
    }

    #[test]
    fn test_drill_serializes_camel_case_iso_timestamps() {
        let now = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let json = serde_json::to_value(Drill::new("d1", now)).unwrap();
        assert_eq!(json["intervalDays"], 1);
        assert_eq!(json["easinessFactor"], 2.5);
        assert_eq!(json["dueAt"], "2024-01-01T00:00:00Z");
    }

    #[test]
    fn test_drill_mastered_defaults_when_absent() {
        let drill: Drill = serde_json::from_str(
            r#"{"id":"d1","intervalDays":3,"repetitionCount":2,"easinessFactor":2.1,"dueAt":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(!drill.mastered);
        assert_eq!(drill.repetition_count, 2);
    }
}
