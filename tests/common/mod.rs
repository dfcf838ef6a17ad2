#![allow(dead_code)]

use chrono::{DateTime, Utc};
use tracing_subscriber::EnvFilter;

use danci_scheduler::{Drill, HistoryItem, TaskId};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}

pub fn ts(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw).unwrap().with_timezone(&Utc)
}

pub fn catalog(ids: &[&str]) -> Vec<TaskId> {
    ids.iter().map(|s| s.to_string()).collect()
}

pub fn history(entries: &[(&str, f64)]) -> Vec<HistoryItem> {
    let at = ts("2024-01-01T00:00:00Z");
    entries
        .iter()
        .map(|(id, score)| HistoryItem::new(*id, *score, at))
        .collect()
}

pub fn drill_due_at(id: &str, due_at: DateTime<Utc>) -> Drill {
    Drill::new(id, due_at)
}
