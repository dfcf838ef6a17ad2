use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::scheduler::calibration::CalibrationBounds;
use crate::scheduler::ranking::DEFAULT_RANK_LIMIT;
use crate::scheduler::remediation::RemediationTable;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub calibration: CalibrationBounds,
    pub rank_limit: usize,
    pub ai_timeout: Option<Duration>,
    pub remediation_table: Arc<RemediationTable>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            calibration: CalibrationBounds::default(),
            rank_limit: DEFAULT_RANK_LIMIT,
            ai_timeout: None,
            remediation_table: Arc::new(RemediationTable::builtin()),
        }
    }
}

impl SchedulerConfig {
    /// Loads `.env` when present, then reads the environment.
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_env()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = CalibrationBounds::default();
        let min = parse_var(&lookup, "SCHEDULER_LEVEL_MIN").unwrap_or(defaults.min);
        let max = parse_var(&lookup, "SCHEDULER_LEVEL_MAX").unwrap_or(defaults.max);
        let calibration = if min <= max {
            CalibrationBounds::new(min, max)
        } else {
            warn!(min, max, "SCHEDULER_LEVEL_MIN exceeds SCHEDULER_LEVEL_MAX, using defaults");
            defaults
        };

        let rank_limit = parse_var(&lookup, "SCHEDULER_RANK_LIMIT").unwrap_or(DEFAULT_RANK_LIMIT);
        let ai_timeout_ms: Option<u64> = parse_var(&lookup, "SCHEDULER_AI_TIMEOUT_MS");
        let ai_timeout = ai_timeout_ms.filter(|ms| *ms > 0).map(Duration::from_millis);

        let remediation_table = match lookup("SCHEDULER_REMEDIATION_TABLE").filter(|v| !v.trim().is_empty()) {
            Some(raw) => RemediationTable::from_json(&raw).unwrap_or_else(|err| {
                warn!(error = %err, "invalid SCHEDULER_REMEDIATION_TABLE, using built-in table");
                RemediationTable::builtin()
            }),
            None => RemediationTable::builtin(),
        };

        Self {
            calibration,
            rank_limit,
            ai_timeout,
            remediation_table: Arc::new(remediation_table),
        }
    }
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key)?.trim().parse().ok()
}
