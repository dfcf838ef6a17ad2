use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scheduler::types::TaskId;

/// Which tier produced the selected task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionSource {
    Remediation,
    Review,
    Recommendation,
    Ai,
    CatalogFallback,
}

impl SelectionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Remediation => "remediation",
            Self::Review => "review",
            Self::Recommendation => "recommendation",
            Self::Ai => "ai",
            Self::CatalogFallback => "catalog_fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSelected {
    pub selection_id: String,
    pub task_id: TaskId,
    pub source: SelectionSource,
    pub level: i32,
    pub candidate_count: usize,
    pub selected_at: DateTime<Utc>,
}

/// Receives one report per completed selection.
pub trait AnalyticsSink: Send + Sync {
    fn record_selection(&self, event: &TaskSelected);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAnalytics;

impl AnalyticsSink for NoopAnalytics {
    fn record_selection(&self, _event: &TaskSelected) {}
}

impl<F> AnalyticsSink for F
where
    F: Fn(&TaskSelected) + Send + Sync,
{
    fn record_selection(&self, event: &TaskSelected) {
        self(event)
    }
}
