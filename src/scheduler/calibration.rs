use serde::{Deserialize, Serialize};

use crate::scheduler::types::Performance;

const PROMOTE_ACCURACY: f64 = 0.85;
const DEMOTE_ACCURACY: f64 = 0.60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationBounds {
    pub min: i32,
    pub max: i32,
}

impl Default for CalibrationBounds {
    fn default() -> Self {
        Self { min: 1, max: 10 }
    }
}

impl CalibrationBounds {
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    fn clamp(&self, level: i32) -> i32 {
        // not i32::clamp: a misconfigured min > max must not panic
        level.max(self.min).min(self.max)
    }
}

/// Adjusts the difficulty level within the default 1..=10 range.
pub fn calibrate(performance: &Performance) -> i32 {
    calibrate_within(performance, CalibrationBounds::default())
}

/// Moves the level one step up above 85% accuracy, one step down below 60%.
pub fn calibrate_within(performance: &Performance, bounds: CalibrationBounds) -> i32 {
    let accuracy = performance.accuracy();
    let level = if accuracy > PROMOTE_ACCURACY {
        performance.level.saturating_add(1)
    } else if accuracy < DEMOTE_ACCURACY {
        performance.level.saturating_sub(1)
    } else {
        performance.level
    };
    bounds.clamp(level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_attempts_demotes() {
        assert_eq!(calibrate(&Performance::new(5, 0, 0)), 4);
        assert_eq!(calibrate(&Performance::new(1, 0, 0)), 1);
    }

    #[test]
    fn test_high_accuracy_promotes() {
        assert_eq!(calibrate(&Performance::new(5, 9, 10)), 6);
        assert_eq!(calibrate(&Performance::new(10, 10, 10)), 10);
    }

    #[test]
    fn test_boundaries_are_exclusive() {
        // 0.85 and 0.60 exactly leave the level alone
        assert_eq!(calibrate(&Performance::new(5, 17, 20)), 5);
        assert_eq!(calibrate(&Performance::new(5, 3, 5)), 5);
    }

    #[test]
    fn test_out_of_range_level_is_clamped() {
        assert_eq!(calibrate(&Performance::new(42, 7, 10)), 10);
        assert_eq!(calibrate(&Performance::new(-3, 7, 10)), 1);
    }

    #[test]
    fn test_custom_bounds() {
        let bounds = CalibrationBounds::new(2, 4);
        assert_eq!(calibrate_within(&Performance::new(4, 10, 10), bounds), 4);
        assert_eq!(calibrate_within(&Performance::new(2, 0, 10), bounds), 2);
    }

    #[test]
    fn test_inverted_bounds_do_not_panic() {
        let level = calibrate_within(&Performance::new(5, 5, 10), CalibrationBounds::new(8, 3));
        assert_eq!(level, 3);
    }
}
