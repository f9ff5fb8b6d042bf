use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Measurement, DEFAULT_NOTE};

/// Append-only log of marked measurements, most recent first.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct LapLog {
    entries: Vec<Measurement>,
}

impl LapLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the current elapsed time as a new measurement and put it at
    /// the head of the log.
    ///
    /// Callers must only mark once time has accumulated (`elapsed_ms > 0`);
    /// the state machine drops marks taken at zero before they get here.
    pub fn mark(&mut self, elapsed_ms: u64, note: &str, at: DateTime<Utc>) -> Measurement {
        debug_assert!(elapsed_ms > 0, "mark requires accumulated time");

        let note = if note.is_empty() { DEFAULT_NOTE } else { note };
        let measurement = Measurement {
            id: Uuid::new_v4().to_string(),
            timestamp: at.timestamp_millis(),
            duration: elapsed_ms,
            note: note.to_string(),
        };

        self.entries.insert(0, measurement.clone());
        measurement
    }

    pub fn entries(&self) -> &[Measurement] {
        &self.entries
    }

    pub fn latest(&self) -> Option<&Measurement> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
