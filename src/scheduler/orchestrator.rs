//! Next-task selection
//!
//! Priority, strictly in this order:
//! 1. remedial exercises for diagnosed error tags
//! 2. drills whose review is due
//! 3. general recommendations ranked from history
//!
//! An optional suggestion provider may replace the winning tier outright.
//! Provider failures never surface; the deterministic choice stands.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use tracing::{debug, warn};

use crate::config::SchedulerConfig;
use crate::scheduler::analytics::{AnalyticsSink, SelectionSource, TaskSelected};
use crate::scheduler::calibration::{calibrate_within, CalibrationBounds};
use crate::scheduler::memory::is_due;
use crate::scheduler::ranking::{rank, DEFAULT_RANK_LIMIT};
use crate::scheduler::remediation::{RemediationMapper, RemediationTable};
use crate::scheduler::suggestion::{SuggestionProvider, WithTimeout};
use crate::scheduler::types::{Drill, HistoryItem, Performance, TaskId};

/// Everything the host knows about the learner for one decision.
#[derive(Debug, Clone, Copy)]
pub struct SelectionInput<'a> {
    pub history: &'a [HistoryItem],
    pub catalog: &'a [TaskId],
    pub performance: Performance,
    pub errors: &'a [String],
    pub drills: &'a [Drill],
    pub now: Option<DateTime<Utc>>,
}

impl<'a> SelectionInput<'a> {
    pub fn new(
        history: &'a [HistoryItem],
        catalog: &'a [TaskId],
        performance: Performance,
        errors: &'a [String],
        drills: &'a [Drill],
    ) -> Self {
        Self {
            history,
            catalog,
            performance,
            errors,
            drills,
            now: None,
        }
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub task_id: TaskId,
    pub source: SelectionSource,
    pub level: i32,
    pub candidates: Vec<TaskId>,
}

#[derive(Debug, Clone)]
pub struct NextTaskOrchestrator {
    mapper: RemediationMapper,
    bounds: CalibrationBounds,
    rank_limit: usize,
    ai_timeout: Option<Duration>,
}

impl Default for NextTaskOrchestrator {
    fn default() -> Self {
        Self::new(RemediationMapper::default())
    }
}

impl NextTaskOrchestrator {
    pub fn new(mapper: RemediationMapper) -> Self {
        Self {
            mapper,
            bounds: CalibrationBounds::default(),
            rank_limit: DEFAULT_RANK_LIMIT,
            ai_timeout: None,
        }
    }

    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self {
            mapper: RemediationMapper::from_shared(Arc::clone(&config.remediation_table)),
            bounds: config.calibration,
            rank_limit: config.rank_limit,
            ai_timeout: config.ai_timeout,
        }
    }

    pub fn with_table(table: RemediationTable) -> Self {
        Self::new(RemediationMapper::new(table))
    }

    pub fn with_bounds(mut self, bounds: CalibrationBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_rank_limit(mut self, limit: usize) -> Self {
        self.rank_limit = limit;
        self
    }

    pub fn with_ai_timeout(mut self, timeout: Duration) -> Self {
        self.ai_timeout = Some(timeout);
        self
    }

    pub fn mapper(&self) -> &RemediationMapper {
        &self.mapper
    }

    /// Picks the next task id; `None` only when there is nothing at all to offer.
    pub async fn select_next_task(
        &self,
        input: &SelectionInput<'_>,
        analytics: Option<&dyn AnalyticsSink>,
        provider: Option<&dyn SuggestionProvider>,
    ) -> Option<TaskId> {
        self.select(input, analytics, provider)
            .await
            .map(|selection| selection.task_id)
    }

    /// Same decision as [`select_next_task`](Self::select_next_task) with the tier that produced it.
    pub async fn select(
        &self,
        input: &SelectionInput<'_>,
        analytics: Option<&dyn AnalyticsSink>,
        provider: Option<&dyn SuggestionProvider>,
    ) -> Option<Selection> {
        let (level, source, candidates) = self.deterministic_candidates(input);

        let suggested = match provider {
            Some(provider) => self.consult(provider, level, &candidates).await,
            None => None,
        };

        let selection = match suggested {
            Some(task_id) => Selection {
                task_id,
                source: SelectionSource::Ai,
                level,
                candidates,
            },
            None => {
                let (task_id, source) = match candidates.first() {
                    Some(first) => (first.clone(), source),
                    None => (input.catalog.first()?.clone(), SelectionSource::CatalogFallback),
                };
                Selection {
                    task_id,
                    source,
                    level,
                    candidates,
                }
            }
        };

        debug!(
            task_id = %selection.task_id,
            source = selection.source.as_str(),
            level,
            "next task selected"
        );

        if let Some(sink) = analytics {
            sink.record_selection(&TaskSelected {
                selection_id: uuid::Uuid::new_v4().to_string(),
                task_id: selection.task_id.clone(),
                source: selection.source,
                level,
                candidate_count: selection.candidates.len(),
                selected_at: Utc::now(),
            });
        }

        Some(selection)
    }

    fn deterministic_candidates(&self, input: &SelectionInput<'_>) -> (i32, SelectionSource, Vec<TaskId>) {
        let now = input.now.unwrap_or_else(Utc::now);

        let level = calibrate_within(&input.performance, self.bounds);
        let remedial = self.mapper.map_to_remedial(input.errors);
        let due: Vec<TaskId> = input
            .drills
            .iter()
            .filter(|drill| is_due(drill, now))
            .map(|drill| drill.id.clone())
            .collect();
        let recommended = rank(input.history, input.catalog, self.rank_limit);

        debug!(
            level,
            remedial = remedial.len(),
            due = due.len(),
            recommended = recommended.len(),
            "candidate tiers computed"
        );

        if !remedial.is_empty() {
            (level, SelectionSource::Remediation, remedial)
        } else if !due.is_empty() {
            (level, SelectionSource::Review, due)
        } else {
            (level, SelectionSource::Recommendation, recommended)
        }
    }

    async fn consult(
        &self,
        provider: &dyn SuggestionProvider,
        level: i32,
        candidates: &[TaskId],
    ) -> Option<TaskId> {
        let call = async {
            match self.ai_timeout {
                Some(timeout) => WithTimeout::new(provider, timeout).suggest(level, candidates).await,
                None => provider.suggest(level, candidates).await,
            }
        };

        let outcome = match AssertUnwindSafe(call).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(level, candidates = candidates.len(), "suggestion provider panicked, using fallback");
                return None;
            }
        };

        match outcome {
            Ok(suggestions) => match suggestions.into_iter().next() {
                Some(first) if !first.trim().is_empty() => Some(first),
                Some(_) => {
                    warn!(level, "suggestion provider returned a blank task id, using fallback");
                    None
                }
                None => {
                    debug!(level, "suggestion provider had no opinion");
                    None
                }
            },
            Err(err) => {
                warn!(error = %err, level, candidates = candidates.len(), "suggestion provider failed, using fallback");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::suggestion::SuggestionError;
    use chrono::Duration as ChronoDuration;
    use futures::future::BoxFuture;
    use parking_lot::Mutex;

    struct Fixed(Vec<&'static str>);

    impl SuggestionProvider for Fixed {
        fn suggest<'a>(
            &'a self,
            _level: i32,
            _candidates: &'a [TaskId],
        ) -> BoxFuture<'a, Result<Vec<TaskId>, SuggestionError>> {
            let ids = self.0.iter().map(|s| s.to_string()).collect();
            async move { Ok(ids) }.boxed()
        }
    }

    struct Recording(Mutex<Option<(i32, Vec<TaskId>)>>);

    impl SuggestionProvider for Recording {
        fn suggest<'a>(
            &'a self,
            level: i32,
            candidates: &'a [TaskId],
        ) -> BoxFuture<'a, Result<Vec<TaskId>, SuggestionError>> {
            *self.0.lock() = Some((level, candidates.to_vec()));
            async { Ok(Vec::new()) }.boxed()
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-01T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn catalog() -> Vec<TaskId> {
        vec!["reading-1".into(), "writing-1".into(), "speaking-1".into()]
    }

    fn due_drill(id: &str) -> Drill {
        Drill::new(id, now() - ChronoDuration::days(1))
    }

    #[tokio::test]
    async fn test_remediation_outranks_review() {
        let catalog = catalog();
        let errors = vec!["grammar".to_string()];
        let drills = vec![due_drill("d1")];
        let input = SelectionInput::new(&[], &catalog, Performance::default(), &errors, &drills).at(now());

        let selection = NextTaskOrchestrator::default().select(&input, None, None).await.unwrap();
        assert_eq!(selection.source, SelectionSource::Remediation);
        assert_eq!(selection.task_id, "grammar-articles");
    }

    #[tokio::test]
    async fn test_not_yet_due_drill_is_skipped() {
        let catalog = catalog();
        let drills = vec![Drill::new("d1", now() + ChronoDuration::hours(1))];
        let input = SelectionInput::new(&[], &catalog, Performance::default(), &[], &drills).at(now());

        let selection = NextTaskOrchestrator::default().select(&input, None, None).await.unwrap();
        assert_eq!(selection.source, SelectionSource::Recommendation);
        assert_eq!(selection.task_id, "reading-1");
    }

    #[tokio::test]
    async fn test_provider_sees_level_and_candidates() {
        let catalog = catalog();
        let drills = vec![due_drill("d1"), due_drill("d2")];
        let input = SelectionInput::new(&[], &catalog, Performance::new(4, 9, 10), &[], &drills).at(now());
        let provider = Recording(Mutex::new(None));

        let task = NextTaskOrchestrator::default()
            .select_next_task(&input, None, Some(&provider))
            .await;

        assert_eq!(task.as_deref(), Some("d1"));
        let seen = provider.0.lock().clone().unwrap();
        assert_eq!(seen.0, 5);
        assert_eq!(seen.1, vec!["d1", "d2"]);
    }

    #[tokio::test]
    async fn test_provider_override_is_total() {
        let catalog = catalog();
        let errors = vec!["grammar".to_string()];
        let input = SelectionInput::new(&[], &catalog, Performance::default(), &errors, &[]).at(now());

        let selection = NextTaskOrchestrator::default()
            .select(&input, None, Some(&Fixed(vec!["listening-9", "x"])))
            .await
            .unwrap();
        assert_eq!(selection.source, SelectionSource::Ai);
        assert_eq!(selection.task_id, "listening-9");
    }

    #[tokio::test]
    async fn test_blank_suggestion_falls_back() {
        let catalog = catalog();
        let input = SelectionInput::new(&[], &catalog, Performance::default(), &[], &[]).at(now());

        let selection = NextTaskOrchestrator::default()
            .select(&input, None, Some(&Fixed(vec!["  "])))
            .await
            .unwrap();
        assert_eq!(selection.source, SelectionSource::Recommendation);
    }

    #[tokio::test]
    async fn test_empty_everything_yields_none_without_report() {
        let reports = Mutex::new(0usize);
        let sink = |_: &TaskSelected| *reports.lock() += 1;
        let input = SelectionInput::new(&[], &[], Performance::default(), &[], &[]).at(now());

        let task = NextTaskOrchestrator::default()
            .select_next_task(&input, Some(&sink), None)
            .await;
        assert!(task.is_none());
        assert_eq!(*reports.lock(), 0);
    }

    #[tokio::test]
    async fn test_zero_rank_limit_uses_catalog_fallback() {
        let catalog = catalog();
        let input = SelectionInput::new(&[], &catalog, Performance::default(), &[], &[]).at(now());

        let selection = NextTaskOrchestrator::default()
            .with_rank_limit(0)
            .select(&input, None, None)
            .await
            .unwrap();
        assert_eq!(selection.source, SelectionSource::CatalogFallback);
        assert_eq!(selection.task_id, "reading-1");
    }
}
