//! Vocabulary review schedule
//!
//! Vocabulary items step through a fixed table keyed by the count of
//! consecutive successful reviews instead of an easiness-scaled interval:
//! 1, 2, 4, 7, 15, 30, 60, 120 days. Mastery here is interval based and is
//! intentionally not the SM-2 rule.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scheduler::memory::sm2::due_after;
use crate::scheduler::types::MIN_EASINESS;

pub const VOCAB_INTERVAL_STEPS: [u32; 8] = [1, 2, 4, 7, 15, 30, 60, 120];
pub const VOCAB_MASTERY_INTERVAL_DAYS: u32 = 60;

const DEFAULT_VOCAB_EASE: f64 = 2.3;

pub fn vocab_interval_days(repetitions: u32) -> u32 {
    let index = (repetitions as usize).min(VOCAB_INTERVAL_STEPS.len() - 1);
    VOCAB_INTERVAL_STEPS[index]
}

pub fn is_vocab_mastered(repetitions: u32) -> bool {
    vocab_interval_days(repetitions) >= VOCAB_MASTERY_INTERVAL_DAYS
}

pub fn vocab_due_at(repetitions: u32, now: DateTime<Utc>) -> DateTime<Utc> {
    due_after(now, vocab_interval_days(repetitions))
}

/// Four-button grade shown on vocabulary review cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VocabGrade {
    Again = 1,
    Hard = 2,
    Good = 3,
    Easy = 4,
}

impl VocabGrade {
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Again),
            2 => Some(Self::Hard),
            3 => Some(Self::Good),
            4 => Some(Self::Easy),
            _ => None,
        }
    }

    pub fn is_pass(&self) -> bool {
        *self != Self::Again
    }

    fn ease_delta(&self) -> f64 {
        match self {
            Self::Again => -0.3,
            Self::Hard => -0.05,
            Self::Good => 0.05,
            Self::Easy => 0.15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VocabStatus {
    #[default]
    New,
    Learning,
    Mastered,
}

/// Per-word review state as persisted by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabStats {
    pub status: VocabStatus,
    pub ease_factor: f64,
    pub streak_correct: u32,
    pub interval_days: u32,
    pub last_seen_at: DateTime<Utc>,
    pub next_due_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabReview {
    pub stats: VocabStats,
    pub mastered: bool,
}

pub fn grade_vocab(previous: Option<&VocabStats>, grade: VocabGrade, now: DateTime<Utc>) -> VocabReview {
    let pass = grade.is_pass();
    let streak = if pass {
        previous.map_or(0, |p| p.streak_correct).saturating_add(1)
    } else {
        0
    };
    let interval_days = if pass { vocab_interval_days(streak) } else { 0 };
    let next_due_at = due_after(now, interval_days);
    let mastered = pass && is_vocab_mastered(streak);

    let status = if !pass && previous.is_none() {
        VocabStatus::New
    } else if mastered {
        VocabStatus::Mastered
    } else {
        VocabStatus::Learning
    };

    VocabReview {
        stats: VocabStats {
            status,
            ease_factor: next_ease_factor(previous.map(|p| p.ease_factor), grade),
            streak_correct: streak,
            interval_days,
            last_seen_at: now,
            next_due_at,
        },
        mastered,
    }
}

fn next_ease_factor(previous: Option<f64>, grade: VocabGrade) -> f64 {
    let base = previous.filter(|v| v.is_finite()).unwrap_or(DEFAULT_VOCAB_EASE);
    let next = (base + grade.ease_delta()).max(MIN_EASINESS);
    if next.is_finite() {
        (next * 100.0).round() / 100.0
    } else {
        DEFAULT_VOCAB_EASE
    }
}

/// Review-queue priority after a grade; lapses bubble items up.
pub fn next_queue_priority(previous: Option<i32>, grade: VocabGrade) -> i32 {
    match (previous, grade) {
        (Some(p), VocabGrade::Again) => p.saturating_add(1).max(1),
        (Some(p), _) => p.saturating_sub(1).max(0),
        (None, VocabGrade::Again) => 1,
        (None, _) => 0,
    }
}
