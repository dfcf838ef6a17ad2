//! Practice scheduling core
//!
//! Contains:
//! - Calibration - difficulty level from recent accuracy
//! - Remediation - error tags to remedial exercises
//! - Ranking - catalog ordered by worst historical score
//! - Memory - SM-2 and vocabulary review schedules, due predicate
//! - Orchestrator - next-task decision with optional AI override

pub mod analytics;
pub mod calibration;
pub mod memory;
pub mod orchestrator;
pub mod ranking;
pub mod remediation;
pub mod suggestion;
pub mod types;

pub use analytics::{AnalyticsSink, NoopAnalytics, SelectionSource, TaskSelected};
pub use calibration::{calibrate, calibrate_within, CalibrationBounds};
pub use memory::{is_due, is_due_now, next_interval, schedule_review};
pub use orchestrator::{NextTaskOrchestrator, Selection, SelectionInput};
pub use ranking::{rank, DEFAULT_RANK_LIMIT};
pub use remediation::{map_to_remedial, tag_counts, RemediationError, RemediationMapper, RemediationTable};
pub use suggestion::{parse_suggestions, SuggestionError, SuggestionProvider, WithTimeout};
pub use types::*;
