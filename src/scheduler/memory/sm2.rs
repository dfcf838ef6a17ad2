//! SM-2 style review scheduling
//!
//! EF' = max(1.3, EF + 0.1 - (5 - q) * (0.08 + (5 - q) * 0.02))
//!
//! Interval:
//! - q < 3: back to 1 day
//! - previous interval <= 1 day: 1 day
//! - otherwise: round(previous * EF')
//!
//! Intervals are capped at `MAX_INTERVAL_DAYS` so due dates stay representable.
//!
//! Mastery is advisory: 8 successful reviews or an interval of 60+ days.

use chrono::{DateTime, Duration, Utc};

use crate::scheduler::types::{
    Drill, IntervalStep, ScheduleReviewInput, ScheduleReviewResult, DEFAULT_EASINESS, MIN_EASINESS,
};

pub const MAX_QUALITY: u8 = 5;
pub const PASSING_QUALITY: u8 = 3;
pub const MASTERY_REPETITIONS: u32 = 8;
pub const MASTERY_INTERVAL_DAYS: u32 = 60;
/// Upper bound for a scheduled interval (100 years).
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

const EASINESS_PRECISION: f64 = 10_000.0;

pub fn next_interval(easiness: f64, quality: u8, prev_interval_days: f64) -> IntervalStep {
    let quality = quality.min(MAX_QUALITY);
    let miss = f64::from(MAX_QUALITY - quality);
    let next_easiness = (easiness + 0.1 - miss * (0.08 + miss * 0.02)).max(MIN_EASINESS);

    let next_days = if quality < PASSING_QUALITY || prev_interval_days <= 1.0 {
        1
    } else {
        ((prev_interval_days * next_easiness)
            .round()
            .clamp(1.0, f64::from(MAX_INTERVAL_DAYS)) as u32)
            .max(1)
    };

    IntervalStep {
        next_days,
        next_easiness,
    }
}

pub fn is_mastered(repetitions: u32, interval_days: u32) -> bool {
    repetitions >= MASTERY_REPETITIONS || interval_days >= MASTERY_INTERVAL_DAYS
}

/// Runs one grading transaction. The caller persists the result.
pub fn schedule_review(input: &ScheduleReviewInput) -> ScheduleReviewResult {
    let now = input.now.unwrap_or_else(Utc::now);
    let easiness = input
        .easiness
        .filter(|e| e.is_finite())
        .unwrap_or(DEFAULT_EASINESS);
    let prev_interval = if input.interval_days.is_finite() {
        input.interval_days.max(1.0)
    } else {
        1.0
    };
    let quality = input.quality.min(MAX_QUALITY);

    let step = next_interval(easiness, quality, prev_interval);

    let prior = input.repetitions.unwrap_or(0);
    let repetitions = if quality >= PASSING_QUALITY {
        prior.saturating_add(1)
    } else {
        prior
    };

    ScheduleReviewResult {
        next_interval_days: step.next_days,
        next_easiness: round_easiness(step.next_easiness),
        next_due_at: due_after(now, step.next_days),
        mastered: is_mastered(repetitions, step.next_days),
        repetitions,
    }
}

/// True once the drill's due timestamp has been reached.
pub fn is_due(drill: &Drill, now: DateTime<Utc>) -> bool {
    drill.due_at <= now
}

/// `now` plus `days`, saturating at the latest representable instant.
pub fn due_after(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    now.checked_add_signed(Duration::days(i64::from(days)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

pub fn is_due_now(drill: &Drill) -> bool {
    is_due(drill, Utc::now())
}

impl Drill {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        is_due(self, now)
    }

    /// Returns the drill as it stands after a review graded `quality`.
    pub fn reviewed(&self, quality: u8, now: DateTime<Utc>) -> Drill {
        let result = schedule_review(&ScheduleReviewInput {
            easiness: Some(self.easiness_factor),
            interval_days: f64::from(self.interval_days),
            quality,
            repetitions: Some(self.repetition_count),
            now: Some(now),
        });
        Drill {
            id: self.id.clone(),
            interval_days: result.next_interval_days,
            repetition_count: result.repetitions,
            easiness_factor: result.next_easiness,
            due_at: result.next_due_at,
            mastered: result.mastered,
        }
    }
}

fn round_easiness(value: f64) -> f64 {
    (value * EASINESS_PRECISION).round() / EASINESS_PRECISION
}
