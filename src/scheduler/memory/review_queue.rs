//! Vocabulary review queue
//!
//! Every graded item keeps a queue entry holding its due date and a lapse
//! priority. The due queue keeps entries due at `now`, orders each item type
//! by due date, then priority (highest first), then creation time, and
//! interleaves the types round-robin following a mix sequence.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::scheduler::memory::vocab::{next_queue_priority, VocabGrade, VocabReview};
use crate::scheduler::types::TaskId;

pub const DEFAULT_QUEUE_LIMIT: usize = 10;
pub const MAX_QUEUE_LIMIT: usize = 50;

pub const DEFAULT_MIX: [ReviewItemType; 5] = [
    ReviewItemType::Word,
    ReviewItemType::Collocation,
    ReviewItemType::Word,
    ReviewItemType::Collocation,
    ReviewItemType::Gap,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewItemType {
    Word,
    Collocation,
    Gap,
}

impl ReviewItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Word => "word",
            Self::Collocation => "collocation",
            Self::Gap => "gap",
        }
    }
}

impl fmt::Display for ReviewItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown review item type: {0}")]
pub struct UnknownItemType(pub String);

impl FromStr for ReviewItemType {
    type Err = UnknownItemType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "word" => Ok(Self::Word),
            "collocation" => Ok(Self::Collocation),
            "gap" => Ok(Self::Gap),
            other => Err(UnknownItemType(other.to_string())),
        }
    }
}

/// Parses a comma-separated mix such as `"word,gap"`; unknown parts are
/// skipped and an empty result falls back to `DEFAULT_MIX`.
pub fn parse_mix(raw: &str) -> Vec<ReviewItemType> {
    let mix: Vec<ReviewItemType> = raw.split(',').filter_map(|part| part.parse().ok()).collect();
    if mix.is_empty() {
        DEFAULT_MIX.to_vec()
    } else {
        mix
    }
}

/// Missing or zero limits use the default; everything else is capped.
pub fn clamp_queue_limit(requested: Option<usize>) -> usize {
    match requested {
        None | Some(0) => DEFAULT_QUEUE_LIMIT,
        Some(limit) => limit.min(MAX_QUEUE_LIMIT),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQueueEntry {
    pub item_type: ReviewItemType,
    pub item_ref_id: TaskId,
    pub due_at: DateTime<Utc>,
    pub priority: i32,
    pub created_at: DateTime<Utc>,
}

impl ReviewQueueEntry {
    pub fn new(item_type: ReviewItemType, item_ref_id: impl Into<TaskId>, now: DateTime<Utc>) -> Self {
        Self {
            item_type,
            item_ref_id: item_ref_id.into(),
            due_at: now,
            priority: 0,
            created_at: now,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due_at <= now
    }
}

/// Queue entry for an item that was just graded. `previous` is the item's
/// existing entry, if it had one; `review` is the matching `grade_vocab` output.
pub fn grade_queue_entry(
    previous: Option<&ReviewQueueEntry>,
    item_type: ReviewItemType,
    item_ref_id: impl Into<TaskId>,
    grade: VocabGrade,
    review: &VocabReview,
    now: DateTime<Utc>,
) -> ReviewQueueEntry {
    ReviewQueueEntry {
        item_type,
        item_ref_id: item_ref_id.into(),
        due_at: if grade.is_pass() { review.stats.next_due_at } else { now },
        priority: next_queue_priority(previous.map(|p| p.priority), grade),
        created_at: previous.map_or(now, |p| p.created_at),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DueQueue {
    pub items: Vec<ReviewQueueEntry>,
    /// Due entries per requested type, before the limit is applied.
    pub totals: BTreeMap<ReviewItemType, usize>,
    pub overall: usize,
}

pub fn build_due_queue(
    entries: &[ReviewQueueEntry],
    mix: &[ReviewItemType],
    limit: Option<usize>,
    now: DateTime<Utc>,
) -> DueQueue {
    let limit = clamp_queue_limit(limit);
    let sequence: &[ReviewItemType] = if mix.is_empty() { &DEFAULT_MIX } else { mix };

    let mut buckets: BTreeMap<ReviewItemType, Vec<&ReviewQueueEntry>> = BTreeMap::new();
    for entry in entries
        .iter()
        .filter(|e| e.is_due(now) && sequence.contains(&e.item_type))
    {
        buckets.entry(entry.item_type).or_default().push(entry);
    }

    let totals: BTreeMap<ReviewItemType, usize> =
        buckets.iter().map(|(item_type, bucket)| (*item_type, bucket.len())).collect();
    let overall = totals.values().sum();

    let mut working: BTreeMap<ReviewItemType, VecDeque<&ReviewQueueEntry>> = buckets
        .into_iter()
        .map(|(item_type, mut bucket)| {
            bucket.sort_by(|a, b| {
                a.due_at
                    .cmp(&b.due_at)
                    .then(b.priority.cmp(&a.priority))
                    .then(a.created_at.cmp(&b.created_at))
            });
            bucket.truncate(limit);
            (item_type, VecDeque::from(bucket))
        })
        .collect();

    let mut items = Vec::with_capacity(limit);
    'rounds: while items.len() < limit {
        let mut progressed = false;
        for item_type in sequence {
            if let Some(entry) = working.get_mut(item_type).and_then(|b| b.pop_front()) {
                items.push(entry.clone());
                progressed = true;
                if items.len() >= limit {
                    break 'rounds;
                }
            }
        }
        if !progressed {
            break;
        }
    }

    debug!(due = overall, returned = items.len(), limit, "Due queue built");

    DueQueue {
        items,
        totals,
        overall,
    }
}
