use std::collections::{HashMap, HashSet};

use crate::scheduler::types::{HistoryItem, TaskId};

pub const DEFAULT_RANK_LIMIT: usize = 5;

struct WorstScore<'a> {
    task_id: &'a str,
    score: f64,
    first_seen: usize,
}

/// Ranks catalog tasks by how much practice they need.
///
/// Attempted tasks come first, ordered by their lowest score; ties keep the
/// order in which each task first appeared in `history`. Unattempted tasks
/// follow in catalog order. History entries for tasks outside the catalog are
/// ignored.
pub fn rank(history: &[HistoryItem], catalog: &[TaskId], limit: usize) -> Vec<TaskId> {
    let in_catalog: HashSet<&str> = catalog.iter().map(String::as_str).collect();

    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut worst: Vec<WorstScore<'_>> = Vec::new();
    for item in history {
        let task_id = item.task_id.as_str();
        if !in_catalog.contains(task_id) {
            continue;
        }
        match slots.get(task_id) {
            Some(&slot) => {
                if item.score < worst[slot].score {
                    worst[slot].score = item.score;
                }
            }
            None => {
                slots.insert(task_id, worst.len());
                worst.push(WorstScore {
                    task_id,
                    score: item.score,
                    first_seen: worst.len(),
                });
            }
        }
    }

    worst.sort_by(|a, b| {
        a.score
            .total_cmp(&b.score)
            .then_with(|| a.first_seen.cmp(&b.first_seen))
    });

    worst
        .iter()
        .map(|w| w.task_id)
        .chain(
            catalog
                .iter()
                .map(String::as_str)
                .filter(|id| !slots.contains_key(id)),
        )
        .take(limit)
        .map(str::to_string)
        .collect()
}
