//! Lap measurement model.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Note stored when a mark is taken with an empty note.
pub const DEFAULT_NOTE: &str = "Time mark";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    pub id: String,
    /// Capture instant, milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Elapsed clock time at capture, in milliseconds.
    pub duration: u64,
    pub note: String,
}

impl Measurement {
    pub fn captured_at(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.timestamp)
            .single()
            .unwrap_or_default()
    }
}
