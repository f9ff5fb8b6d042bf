//! Aggregates over the lap log.
//!
//! Nothing here is cached: every call walks the log it is handed, so the
//! numbers always match the log as it is right now.

use serde::Serialize;

use crate::models::Measurement;
use crate::timer::{format_elapsed, format_fractional, Resolution};

/// Arithmetic mean of all durations, unrounded. `0.0` for an empty log.
pub fn average(log: &[Measurement]) -> f64 {
    if log.is_empty() {
        return 0.0;
    }
    let sum: u128 = log.iter().map(|m| u128::from(m.duration)).sum();
    sum as f64 / log.len() as f64
}

pub fn min(log: &[Measurement]) -> u64 {
    log.iter().map(|m| m.duration).min().unwrap_or(0)
}

pub fn max(log: &[Measurement]) -> u64 {
    log.iter().map(|m| m.duration).max().unwrap_or(0)
}

pub fn count(log: &[Measurement]) -> usize {
    log.len()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LapStatistics {
    pub count: usize,
    pub average_ms: f64,
    pub min_ms: u64,
    pub max_ms: u64,
}

impl LapStatistics {
    pub fn from_log(log: &[Measurement]) -> Self {
        Self {
            count: count(log),
            average_ms: average(log),
            min_ms: min(log),
            max_ms: max(log),
        }
    }

    /// Rendered `(average, min, max)` for display.
    pub fn formatted(&self, resolution: Resolution) -> (String, String, String) {
        (
            format_fractional(self.average_ms, resolution),
            format_elapsed(self.min_ms, resolution),
            format_elapsed(self.max_ms, resolution),
        )
    }
}
