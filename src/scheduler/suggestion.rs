use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Deserialize;
use thiserror::Error;

use crate::scheduler::types::TaskId;

#[derive(Debug, Error)]
pub enum SuggestionError {
    #[error("suggestion provider unavailable: {0}")]
    Unavailable(String),
    #[error("suggestion timed out after {0:?}")]
    Timeout(Duration),
    #[error("malformed suggestion: {0}")]
    Malformed(String),
    #[error("JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// External service that may override the deterministic candidate list.
///
/// Receives the calibrated level and the current candidates, answers with
/// task ids in preference order. An empty answer means "no opinion".
pub trait SuggestionProvider: Send + Sync {
    fn suggest<'a>(
        &'a self,
        level: i32,
        candidates: &'a [TaskId],
    ) -> BoxFuture<'a, Result<Vec<TaskId>, SuggestionError>>;
}

impl<P: SuggestionProvider + ?Sized> SuggestionProvider for &P {
    fn suggest<'a>(
        &'a self,
        level: i32,
        candidates: &'a [TaskId],
    ) -> BoxFuture<'a, Result<Vec<TaskId>, SuggestionError>> {
        (**self).suggest(level, candidates)
    }
}

impl<P: SuggestionProvider + ?Sized> SuggestionProvider for std::sync::Arc<P> {
    fn suggest<'a>(
        &'a self,
        level: i32,
        candidates: &'a [TaskId],
    ) -> BoxFuture<'a, Result<Vec<TaskId>, SuggestionError>> {
        (**self).suggest(level, candidates)
    }
}

/// Bounds a provider call; an elapsed deadline becomes `SuggestionError::Timeout`.
pub struct WithTimeout<P> {
    inner: P,
    timeout: Duration,
}

impl<P> WithTimeout<P> {
    pub fn new(inner: P, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl<P: SuggestionProvider> SuggestionProvider for WithTimeout<P> {
    fn suggest<'a>(
        &'a self,
        level: i32,
        candidates: &'a [TaskId],
    ) -> BoxFuture<'a, Result<Vec<TaskId>, SuggestionError>> {
        let timeout = self.timeout;
        async move {
            match tokio::time::timeout(timeout, self.inner.suggest(level, candidates)).await {
                Ok(result) => result,
                Err(_) => Err(SuggestionError::Timeout(timeout)),
            }
        }
        .boxed()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSuggestion {
    List(Vec<TaskId>),
    Wrapped { tasks: Vec<TaskId> },
}

/// Decodes a provider's text reply: `["a", "b"]` or `{"tasks": ["a", "b"]}`.
///
/// Surrounding prose and markdown code fences are tolerated.
pub fn parse_suggestions(raw: &str) -> Result<Vec<TaskId>, SuggestionError> {
    let trimmed = raw.trim();
    let body = match (trimmed.find(['[', '{']), trimmed.rfind([']', '}'])) {
        (Some(start), Some(end)) if start <= end => &trimmed[start..=end],
        _ => return Err(SuggestionError::Malformed(truncate(trimmed))),
    };

    let tasks = match serde_json::from_str::<RawSuggestion>(body)? {
        RawSuggestion::List(tasks) | RawSuggestion::Wrapped { tasks } => tasks,
    };

    Ok(tasks
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect())
}

fn truncate(raw: &str) -> String {
    raw.chars().take(120).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Never;

    impl SuggestionProvider for Never {
        fn suggest<'a>(
            &'a self,
            _level: i32,
            _candidates: &'a [TaskId],
        ) -> BoxFuture<'a, Result<Vec<TaskId>, SuggestionError>> {
            futures::future::pending().boxed()
        }
    }

    #[test]
    fn test_parse_plain_list() {
        assert_eq!(parse_suggestions(r#"["a", " b "]"#).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_parse_wrapped_with_fences() {
        let raw = "Here you go:\n```json\n{\"tasks\": [\"x\", \"\"]}\n```";
        assert_eq!(parse_suggestions(raw).unwrap(), vec!["x"]);
    }

    #[test]
    fn test_parse_rejects_prose() {
        assert!(matches!(
            parse_suggestions("no idea"),
            Err(SuggestionError::Malformed(_))
        ));
        assert!(matches!(
            parse_suggestions("{\"tasks\": 3}"),
            Err(SuggestionError::Json(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_elapses() {
        let provider = WithTimeout::new(Never, Duration::from_millis(250));
        let candidates = vec!["a".to_string()];
        let err = provider.suggest(3, &candidates).await.unwrap_err();
        assert!(matches!(err, SuggestionError::Timeout(d) if d == Duration::from_millis(250)));
    }
}
