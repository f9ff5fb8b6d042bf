use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Result;
use chrono::Utc;
use log::{debug, info, warn};
use serde::Serialize;
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    audio::Chime,
    export,
    laps::LapStatistics,
    models::Measurement,
};

use super::{format_elapsed, parse_calibration_offset, ChronometerState, ClockEvent, ClockState, Resolution};

// Per-tick logging is noisy at 1 ms resolution; flip on when debugging the ticker.
const ENABLE_LOGS: bool = false;

use crate::{log_debug, log_info};

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChronometerSnapshot {
    pub running: bool,
    pub elapsed_ms: u64,
    pub displayed_ms: u64,
    pub display: String,
    pub calibration_offset_ms: i64,
    pub resolution: Resolution,
    pub sound_enabled: bool,
    pub laps: Vec<Measurement>,
    pub statistics: LapStatistics,
}

impl From<&ChronometerState> for ChronometerSnapshot {
    fn from(state: &ChronometerState) -> Self {
        let clock = state.clock;
        Self {
            running: clock.running,
            elapsed_ms: clock.elapsed_ms,
            displayed_ms: clock.displayed_ms(),
            display: format_elapsed(clock.displayed_ms(), clock.resolution),
            calibration_offset_ms: clock.calibration_offset_ms,
            resolution: clock.resolution,
            sound_enabled: state.sound_enabled,
            laps: state.laps.entries().to_vec(),
            statistics: LapStatistics::from_log(state.laps.entries()),
        }
    }
}

/// The live tick source. Dropping it cancels the task, so a ticker can never
/// outlive the controller that owns it.
struct Ticker {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

impl Ticker {
    async fn stop(mut self) {
        self.cancel_token.cancel();
        if let Err(err) = (&mut self.handle).await {
            if !err.is_cancelled() {
                warn!("ticker task failed to join: {err}");
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel_token.cancel();
        self.handle.abort();
    }
}

#[derive(Clone)]
pub struct ChronometerController {
    state: Arc<Mutex<ChronometerState>>,
    ticker: Arc<Mutex<Option<Ticker>>>,
    chime: Arc<dyn Chime>,
}

impl ChronometerController {
    pub fn new(resolution: Resolution, sound_enabled: bool, chime: Arc<dyn Chime>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ChronometerState::new(resolution, sound_enabled))),
            ticker: Arc::new(Mutex::new(None)),
            chime,
        }
    }

    pub async fn clock(&self) -> ClockState {
        self.state.lock().await.clock
    }

    pub async fn get_snapshot(&self) -> ChronometerSnapshot {
        let guard = self.state.lock().await;
        ChronometerSnapshot::from(&*guard)
    }

    pub async fn laps(&self) -> Vec<Measurement> {
        self.state.lock().await.laps.entries().to_vec()
    }

    pub async fn statistics(&self) -> LapStatistics {
        let guard = self.state.lock().await;
        LapStatistics::from_log(guard.laps.entries())
    }

    pub async fn start(&self) -> ClockState {
        let mut ticker_guard = self.ticker.lock().await;
        let clock = self.apply(ClockEvent::Start).await;

        if ticker_guard.is_none() {
            *ticker_guard = Some(self.spawn_ticker(clock.resolution));
            info!("Chronometer started at {} ms", clock.elapsed_ms);
        }

        clock
    }

    pub async fn pause(&self) -> ClockState {
        let mut ticker_guard = self.ticker.lock().await;
        let clock = self.apply(ClockEvent::Pause).await;

        if let Some(ticker) = ticker_guard.take() {
            ticker.stop().await;
            info!("Chronometer paused at {} ms", clock.elapsed_ms);
        }

        clock
    }

    pub async fn reset(&self) -> ClockState {
        let mut ticker_guard = self.ticker.lock().await;
        let clock = self.apply(ClockEvent::Reset).await;

        if let Some(ticker) = ticker_guard.take() {
            ticker.stop().await;
        }
        info!("Chronometer reset");

        clock
    }

    /// Record a lap at the current elapsed time.
    ///
    /// Returns `None` when no time has accumulated yet; nothing is recorded
    /// and no chime plays in that case.
    pub async fn mark(&self, note: &str) -> Option<Measurement> {
        let (measurement, sound_enabled) = {
            let mut guard = self.state.lock().await;
            let before = guard.laps.len();
            let current = std::mem::take(&mut *guard);
            *guard = current.apply(ClockEvent::Mark {
                note: note.to_string(),
                at: Utc::now(),
            });

            let measurement = if guard.laps.len() > before {
                guard.laps.latest().cloned()
            } else {
                None
            };
            (measurement, guard.sound_enabled)
        };

        let Some(measurement) = measurement else {
            debug!("Nothing to mark: no elapsed time");
            return None;
        };

        info!(
            "Marked lap {} at {} ms ({})",
            measurement.id, measurement.duration, measurement.note
        );

        if sound_enabled {
            if let Err(err) = self.chime.chime() {
                warn!("Failed to play mark chime: {err}");
            }
        }

        Some(measurement)
    }

    pub async fn set_calibration(&self, offset_ms: i64) -> ClockState {
        self.apply(ClockEvent::SetCalibration(offset_ms)).await
    }

    /// Set the calibration offset from raw user input, coercing junk to zero.
    pub async fn set_calibration_input(&self, input: &str) -> ClockState {
        self.set_calibration(parse_calibration_offset(input)).await
    }

    pub async fn reset_calibration(&self) -> ClockState {
        self.apply(ClockEvent::ResetCalibration).await
    }

    pub async fn set_sound(&self, enabled: bool) {
        self.apply(ClockEvent::SetSound(enabled)).await;
    }

    /// Export the lap log to `dir`. `Ok(None)` when the log is empty.
    pub async fn export(&self, dir: &Path) -> Result<Option<PathBuf>> {
        let (laps, resolution) = {
            let guard = self.state.lock().await;
            (guard.laps.entries().to_vec(), guard.clock.resolution)
        };
        export::export_to_dir(dir, &laps, resolution, Utc::now())
    }

    /// Stop the clock and release the ticker. Safe to call more than once.
    pub async fn shutdown(&self) {
        self.pause().await;
    }

    async fn apply(&self, event: ClockEvent) -> ClockState {
        let mut guard = self.state.lock().await;
        let current = std::mem::take(&mut *guard);
        *guard = current.apply(event);
        guard.clock
    }

    fn spawn_ticker(&self, resolution: Resolution) -> Ticker {
        let state = self.state.clone();
        let cancel_token = CancellationToken::new();
        let token = cancel_token.clone();

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(resolution.tick_interval());
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; the clock should only
            // advance once a full step has passed.
            interval.tick().await;

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        log_info!("ticker cancelled");
                        break;
                    }
                    _ = interval.tick() => {
                        let mut guard = state.lock().await;
                        if !guard.clock.running {
                            break;
                        }
                        let current = std::mem::take(&mut *guard);
                        *guard = current.apply(ClockEvent::Tick);
                        log_debug!("tick -> {} ms", guard.clock.elapsed_ms);
                    }
                }
            }
        });

        Ticker {
            handle,
            cancel_token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingChime {
        plays: AtomicUsize,
    }

    impl Chime for CountingChime {
        fn chime(&self) -> Result<(), String> {
            self.plays.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct BrokenChime;

    impl Chime for BrokenChime {
        fn chime(&self) -> Result<(), String> {
            Err("no audio device".into())
        }
    }

    fn controller(resolution: Resolution) -> (ChronometerController, Arc<CountingChime>) {
        let chime = Arc::new(CountingChime::default());
        (
            ChronometerController::new(resolution, true, chime.clone()),
            chime,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn advances_while_running() {
        let (ctl, _) = controller(Resolution::Centisecond);
        let clock = ctl.start().await;
        assert!(clock.running);

        time::sleep(Duration::from_millis(1000)).await;
        let clock = ctl.pause().await;

        assert!(!clock.running);
        assert!((980..=1010).contains(&clock.elapsed_ms), "{}", clock.elapsed_ms);
        assert_eq!(clock.elapsed_ms % 10, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn redundant_start_does_not_double_speed() {
        let (ctl, _) = controller(Resolution::Millisecond);
        ctl.start().await;
        ctl.start().await;
        ctl.start().await;

        time::sleep(Duration::from_millis(200)).await;
        let clock = ctl.pause().await;

        assert!((190..=201).contains(&clock.elapsed_ms), "{}", clock.elapsed_ms);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_freezes_elapsed() {
        let (ctl, _) = controller(Resolution::Millisecond);
        ctl.start().await;
        time::sleep(Duration::from_millis(50)).await;
        let frozen = ctl.pause().await.elapsed_ms;

        time::sleep(Duration::from_millis(500)).await;
        assert_eq!(ctl.clock().await.elapsed_ms, frozen);

        // Pausing again is a no-op.
        assert_eq!(ctl.pause().await.elapsed_ms, frozen);
    }

    #[tokio::test(start_paused = true)]
    async fn resume_continues_from_frozen_value() {
        let (ctl, _) = controller(Resolution::Centisecond);
        ctl.start().await;
        time::sleep(Duration::from_millis(300)).await;
        let first = ctl.pause().await.elapsed_ms;

        ctl.start().await;
        time::sleep(Duration::from_millis(300)).await;
        let second = ctl.pause().await.elapsed_ms;

        assert!(second > first);
        assert!((580..=610).contains(&second), "{second}");
    }

    #[tokio::test(start_paused = true)]
    async fn reset_stops_ticker_and_keeps_laps() {
        let (ctl, _) = controller(Resolution::Millisecond);
        ctl.start().await;
        time::sleep(Duration::from_millis(20)).await;
        ctl.mark("lap").await.unwrap();

        let clock = ctl.reset().await;
        assert_eq!(clock.elapsed_ms, 0);
        assert!(!clock.running);

        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(ctl.clock().await.elapsed_ms, 0);
        assert_eq!(ctl.laps().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn marks_are_newest_first_and_chime() {
        let (ctl, chime) = controller(Resolution::Millisecond);
        ctl.start().await;
        time::sleep(Duration::from_millis(30)).await;
        let first = ctl.mark("first").await.unwrap();
        time::sleep(Duration::from_millis(30)).await;
        let second = ctl.mark("").await.unwrap();
        ctl.pause().await;

        let laps = ctl.laps().await;
        assert_eq!(laps.len(), 2);
        assert_eq!(laps[0].id, second.id);
        assert_eq!(laps[1].id, first.id);
        assert!(laps[0].duration > laps[1].duration);
        assert_eq!(laps[0].note, crate::models::DEFAULT_NOTE);
        assert_eq!(chime.plays.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn mark_before_any_time_records_nothing() {
        let (ctl, chime) = controller(Resolution::Millisecond);
        assert!(ctl.mark("too early").await.is_none());
        assert!(ctl.laps().await.is_empty());
        assert_eq!(chime.plays.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn silent_when_sound_disabled() {
        let (ctl, chime) = controller(Resolution::Millisecond);
        ctl.set_sound(false).await;
        ctl.start().await;
        time::sleep(Duration::from_millis(5)).await;
        ctl.mark("quiet").await.unwrap();
        ctl.shutdown().await;

        assert_eq!(chime.plays.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn chime_failure_does_not_block_mark() {
        let ctl = ChronometerController::new(Resolution::Millisecond, true, Arc::new(BrokenChime));
        ctl.start().await;
        time::sleep(Duration::from_millis(5)).await;

        let m = ctl.mark("still recorded").await;
        ctl.shutdown().await;

        assert!(m.is_some());
        assert_eq!(ctl.laps().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn calibration_shows_in_snapshot_only() {
        let (ctl, _) = controller(Resolution::Millisecond);
        ctl.start().await;
        time::sleep(Duration::from_millis(10)).await;
        let elapsed = ctl.pause().await.elapsed_ms;

        ctl.set_calibration_input("1000").await;
        ctl.mark("calibrated").await.unwrap();

        let snap = ctl.get_snapshot().await;
        assert_eq!(snap.elapsed_ms, elapsed);
        assert_eq!(snap.displayed_ms, elapsed + 1000);
        assert_eq!(snap.display, format_elapsed(elapsed + 1000, Resolution::Millisecond));
        assert_eq!(snap.laps[0].duration, elapsed);
        assert_eq!(snap.statistics.count, 1);

        ctl.set_calibration_input("garbage").await;
        assert_eq!(ctl.get_snapshot().await.calibration_offset_ms, 0);

        ctl.set_calibration(-5).await;
        ctl.reset_calibration().await;
        assert_eq!(ctl.clock().await.calibration_offset_ms, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_controller_cancels_ticker() {
        let (ctl, _) = controller(Resolution::Millisecond);
        let observer = ctl.state.clone();
        ctl.start().await;
        time::sleep(Duration::from_millis(10)).await;
        drop(ctl);

        let frozen = observer.lock().await.clock.elapsed_ms;
        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(observer.lock().await.clock.elapsed_ms, frozen);
    }

    #[tokio::test(start_paused = true)]
    async fn export_writes_laps() {
        let dir = tempfile::tempdir().unwrap();
        let (ctl, _) = controller(Resolution::Millisecond);

        assert!(ctl.export(dir.path()).await.unwrap().is_none());

        ctl.start().await;
        time::sleep(Duration::from_millis(15)).await;
        ctl.mark("x").await.unwrap();
        ctl.shutdown().await;

        let path = ctl.export(dir.path()).await.unwrap().unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}
