//! Error tag to remedial exercise mapping.
//!
//! The lookup table is an immutable value handed to the mapper at
//! construction; clones share the same table.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scheduler::types::{ErrorTagCounts, TaskId};

#[derive(Debug, Error)]
pub enum RemediationError {
    #[error("JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("remediation table contains a blank tag")]
    EmptyTag,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemediationTable {
    entries: HashMap<String, Vec<TaskId>>,
}

impl RemediationTable {
    pub fn new<I, T, E>(entries: I) -> Self
    where
        I: IntoIterator<Item = (T, Vec<E>)>,
        T: AsRef<str>,
        E: Into<TaskId>,
    {
        let entries = entries
            .into_iter()
            .map(|(tag, exercises)| {
                (
                    normalize_tag(tag.as_ref()),
                    exercises.into_iter().map(Into::into).collect(),
                )
            })
            .collect();
        Self { entries }
    }

    /// Parses `{"tag": ["exercise", ...], ...}`.
    pub fn from_json(raw: &str) -> Result<Self, RemediationError> {
        let parsed: HashMap<String, Vec<TaskId>> = serde_json::from_str(raw)?;
        if parsed.keys().any(|tag| tag.trim().is_empty()) {
            return Err(RemediationError::EmptyTag);
        }
        Ok(Self::new(parsed))
    }

    /// Tags reported by the writing, speaking and vocabulary evaluators.
    pub fn builtin() -> Self {
        Self::new([
            ("grammar", vec!["grammar-articles", "grammar-tenses", "grammar-agreement"]),
            ("lexical", vec!["vocab-collocations", "vocab-word-forms"]),
            ("coherence", vec!["writing-linking-devices", "writing-paragraphing"]),
            ("task", vec!["writing-task-response"]),
            ("general", vec!["writing-proofreading"]),
            ("spelling", vec!["vocab-spelling", "writing-proofreading"]),
            ("pronunciation", vec!["speaking-ipa-minimal-pairs", "speaking-shadowing"]),
            ("fluency", vec!["speaking-shadowing", "speaking-timed-response"]),
            ("listening", vec!["listening-dictation"]),
            ("reading", vec!["reading-tfng", "reading-skimming"]),
        ])
    }

    pub fn exercises_for(&self, tag: &str) -> &[TaskId] {
        self.entries
            .get(&normalize_tag(tag))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct RemediationMapper {
    table: Arc<RemediationTable>,
}

impl RemediationMapper {
    pub fn new(table: RemediationTable) -> Self {
        Self {
            table: Arc::new(table),
        }
    }

    pub fn from_shared(table: Arc<RemediationTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RemediationTable {
        &self.table
    }

    /// Remedial exercises for the reported tags, deduplicated.
    ///
    /// Distinct tags are visited in sorted order so any permutation of the
    /// same multiset yields the same sequence. Unknown tags contribute nothing.
    pub fn map_to_remedial<S: AsRef<str>>(&self, errors: &[S]) -> Vec<TaskId> {
        let counts = tag_counts(errors);
        let mut seen = HashSet::new();
        let mut remedial = Vec::new();
        for tag in counts.keys() {
            for exercise in self.table.exercises_for(tag) {
                if seen.insert(exercise.as_str()) {
                    remedial.push(exercise.clone());
                }
            }
        }
        remedial
    }
}

impl Default for RemediationMapper {
    fn default() -> Self {
        Self::new(RemediationTable::builtin())
    }
}

pub fn tag_counts<S: AsRef<str>>(errors: &[S]) -> ErrorTagCounts {
    let mut counts = ErrorTagCounts::new();
    for tag in errors {
        let tag = normalize_tag(tag.as_ref());
        if tag.is_empty() {
            continue;
        }
        *counts.entry(tag).or_insert(0) += 1;
    }
    counts
}

/// Maps against the built-in table.
pub fn map_to_remedial<S: AsRef<str>>(errors: &[S]) -> Vec<TaskId> {
    RemediationMapper::default().map_to_remedial(errors)
}

fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}
