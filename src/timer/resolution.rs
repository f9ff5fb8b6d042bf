use std::{fmt, str::FromStr, time::Duration};

use anyhow::{anyhow, Error};
use serde::{Deserialize, Serialize};

/// Tick step and display precision of the chronometer.
///
/// One value drives both the accumulator (how far each tick advances the
/// clock, and how often it fires) and the formatter (how many fraction
/// digits are shown).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum Resolution {
    /// 1 ms step, `HH:MM:SS.fff`.
    #[default]
    Millisecond,
    /// 10 ms step, `HH:MM:SS.ff`.
    Centisecond,
}

impl Resolution {
    pub fn step_ms(self) -> u64 {
        match self {
            Resolution::Millisecond => 1,
            Resolution::Centisecond => 10,
        }
    }

    pub fn tick_interval(self) -> Duration {
        Duration::from_millis(self.step_ms())
    }

    pub fn fraction_digits(self) -> usize {
        match self {
            Resolution::Millisecond => 3,
            Resolution::Centisecond => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Millisecond => "ms",
            Resolution::Centisecond => "cs",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ms" | "1" | "millisecond" => Ok(Resolution::Millisecond),
            "cs" | "10" | "centisecond" => Ok(Resolution::Centisecond),
            other => Err(anyhow!("unknown resolution '{other}'")),
        }
    }
}
