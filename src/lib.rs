//! Adaptive practice scheduler for the language-learning platform.
//!
//! Decides which single exercise a learner should attempt next and when
//! spaced-review items resurface. Persistence, transport and UI live in the
//! host; this crate only consumes history/drill/error inputs and returns
//! task identifiers plus new drill states.

pub mod config;
pub mod core;
pub mod scheduler;

pub use config::SchedulerConfig;
pub use scheduler::{
    calibrate, is_due, map_to_remedial, next_interval, rank, schedule_review, tag_counts,
    AnalyticsSink, Drill, HistoryItem, NextTaskOrchestrator, Performance, ScheduleReviewInput,
    ScheduleReviewResult, Selection, SelectionInput, SelectionSource, SuggestionError,
    SuggestionProvider, TaskId,
};
