use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::laps::LapLog;

use super::Resolution;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClockState {
    pub elapsed_ms: u64,
    pub running: bool,
    /// Display-only adjustment; never folded into `elapsed_ms` or stored laps.
    pub calibration_offset_ms: i64,
    pub resolution: Resolution,
}

impl ClockState {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            ..Self::default()
        }
    }

    /// Elapsed time with the calibration offset applied, floored at zero.
    pub fn displayed_ms(&self) -> u64 {
        self.elapsed_ms
            .saturating_add_signed(self.calibration_offset_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClockEvent {
    Start,
    Pause,
    Reset,
    Tick,
    Mark { note: String, at: DateTime<Utc> },
    SetCalibration(i64),
    ResetCalibration,
    SetSound(bool),
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChronometerState {
    pub clock: ClockState,
    pub laps: LapLog,
    pub sound_enabled: bool,
}

impl ChronometerState {
    pub fn new(resolution: Resolution, sound_enabled: bool) -> Self {
        Self {
            clock: ClockState::new(resolution),
            laps: LapLog::new(),
            sound_enabled,
        }
    }

    /// Fold one event into the state.
    pub fn apply(mut self, event: ClockEvent) -> Self {
        match event {
            ClockEvent::Start => self.clock.running = true,
            ClockEvent::Pause => self.clock.running = false,
            ClockEvent::Reset => {
                self.clock.running = false;
                self.clock.elapsed_ms = 0;
            }
            ClockEvent::Tick => {
                if self.clock.running {
                    self.clock.elapsed_ms = self
                        .clock
                        .elapsed_ms
                        .saturating_add(self.clock.resolution.step_ms());
                }
            }
            ClockEvent::Mark { note, at } => {
                if self.clock.elapsed_ms > 0 {
                    self.laps.mark(self.clock.elapsed_ms, &note, at);
                }
            }
            ClockEvent::SetCalibration(offset_ms) => self.clock.calibration_offset_ms = offset_ms,
            ClockEvent::ResetCalibration => self.clock.calibration_offset_ms = 0,
            ClockEvent::SetSound(enabled) => self.sound_enabled = enabled,
        }
        self
    }
}

/// Free-function form of [`ChronometerState::apply`].
pub fn apply(state: ChronometerState, event: ClockEvent) -> ChronometerState {
    state.apply(event)
}

/// Coerce user calibration input to milliseconds. Integers parse as-is,
/// decimals are truncated toward zero, anything else becomes `0`.
pub fn parse_calibration_offset(input: &str) -> i64 {
    let trimmed = input.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return value;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => value.trunc() as i64,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn mark(note: &str) -> ClockEvent {
        ClockEvent::Mark {
            note: note.to_string(),
            at: Utc.timestamp_millis_opt(1_000).unwrap(),
        }
    }

    fn ticks(mut state: ChronometerState, n: usize) -> ChronometerState {
        for _ in 0..n {
            state = state.apply(ClockEvent::Tick);
        }
        state
    }

    #[test]
    fn starts_idle_at_zero() {
        let state = ChronometerState::new(Resolution::Millisecond, true);
        assert_eq!(state.clock.elapsed_ms, 0);
        assert!(!state.clock.running);
        assert!(state.laps.is_empty());
    }

    #[test]
    fn ticks_only_advance_while_running() {
        let state = ChronometerState::new(Resolution::Centisecond, false);
        let state = ticks(state, 5);
        assert_eq!(state.clock.elapsed_ms, 0);

        let state = ticks(state.apply(ClockEvent::Start), 5);
        assert_eq!(state.clock.elapsed_ms, 50);

        let state = ticks(state.apply(ClockEvent::Pause), 5);
        assert_eq!(state.clock.elapsed_ms, 50);
    }

    #[test]
    fn start_and_pause_are_idempotent() {
        let state = ChronometerState::new(Resolution::Millisecond, false)
            .apply(ClockEvent::Start)
            .apply(ClockEvent::Start);
        assert!(state.clock.running);

        let state = state.apply(ClockEvent::Pause).apply(ClockEvent::Pause);
        assert!(!state.clock.running);
    }

    #[test]
    fn reset_keeps_lap_log() {
        let state = ChronometerState::new(Resolution::Millisecond, false).apply(ClockEvent::Start);
        let state = ticks(state, 7).apply(mark("lap"));
        assert_eq!(state.laps.len(), 1);

        let state = state.apply(ClockEvent::Reset);
        assert_eq!(state.clock.elapsed_ms, 0);
        assert!(!state.clock.running);
        assert_eq!(state.laps.len(), 1);
        assert_eq!(state.laps.entries()[0].duration, 7);
    }

    #[test]
    fn mark_at_zero_is_ignored() {
        let state = ChronometerState::new(Resolution::Millisecond, false).apply(mark("early"));
        assert!(state.laps.is_empty());
    }

    #[test]
    fn marks_prepend_in_order() {
        let mut state = ChronometerState::new(Resolution::Millisecond, false);
        state.clock.elapsed_ms = 5000;
        let mut state = state.apply(mark("a"));
        state.clock.elapsed_ms = 9000;
        let state = state.apply(mark("b"));

        let entries = state.laps.entries();
        assert_eq!(entries[0].duration, 9000);
        assert_eq!(entries[1].duration, 5000);
    }

    #[test]
    fn calibration_only_touches_display() {
        let state = ChronometerState::new(Resolution::Millisecond, false).apply(ClockEvent::Start);
        let state = ticks(state, 100).apply(ClockEvent::SetCalibration(250));
        assert_eq!(state.clock.elapsed_ms, 100);
        assert_eq!(state.clock.displayed_ms(), 350);

        let state = state.apply(mark("calibrated"));
        assert_eq!(state.laps.entries()[0].duration, 100);

        let state = state.apply(ClockEvent::SetCalibration(-1_000));
        assert_eq!(state.clock.displayed_ms(), 0);

        let state = state.apply(ClockEvent::ResetCalibration);
        assert_eq!(state.clock.displayed_ms(), 100);
    }

    #[test]
    fn sound_toggle() {
        let state = apply(
            ChronometerState::new(Resolution::Millisecond, true),
            ClockEvent::SetSound(false),
        );
        assert!(!state.sound_enabled);
    }

    #[test]
    fn calibration_input_is_coerced() {
        assert_eq!(parse_calibration_offset("120"), 120);
        assert_eq!(parse_calibration_offset(" -45 "), -45);
        assert_eq!(parse_calibration_offset("12.7"), 12);
        assert_eq!(parse_calibration_offset("-3.9"), -3);
        assert_eq!(parse_calibration_offset("abc"), 0);
        assert_eq!(parse_calibration_offset(""), 0);
        assert_eq!(parse_calibration_offset("NaN"), 0);
    }
}
