//! Review scheduling models
//!
//! Contains:
//! - SM-2 - continuous easiness-scaled intervals used for drills
//! - Vocab - discrete step table for vocabulary items
//! - Review queue - due vocabulary items ordered by due date and lapse priority

pub mod review_queue;
pub mod sm2;
pub mod vocab;

pub use review_queue::{
    build_due_queue, clamp_queue_limit, grade_queue_entry, parse_mix, DueQueue, ReviewItemType,
    ReviewQueueEntry,
};
pub use sm2::{due_after, is_due, is_due_now, is_mastered, next_interval, schedule_review, MAX_INTERVAL_DAYS};
pub use vocab::{
    grade_vocab, is_vocab_mastered, next_queue_priority, vocab_due_at, vocab_interval_days,
    VocabGrade, VocabReview, VocabStats, VocabStatus,
};
