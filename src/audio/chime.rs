use rodio::Source;
use std::f32::consts::PI;
use std::time::Duration;

const SAMPLE_RATE: u32 = 44100;

/// Short sine "beep" played when a lap is marked.
/// Gain starts at `start_gain` and decays exponentially to `end_gain` over the tone.
pub struct MarkChime {
    freq: f32,
    start_gain: f32,
    end_gain: f32,
    total_samples: usize,
    num_sample: usize,
}

impl MarkChime {
    pub fn new(freq: f32, duration: Duration) -> Self {
        let total_samples = (duration.as_millis() * SAMPLE_RATE as u128 / 1000) as usize;
        Self {
            freq,
            start_gain: 0.3,
            end_gain: 0.01,
            total_samples: total_samples.max(1),
            num_sample: 0,
        }
    }

    fn gain_at(&self, progress: f32) -> f32 {
        self.start_gain * (self.end_gain / self.start_gain).powf(progress)
    }
}

impl Default for MarkChime {
    fn default() -> Self {
        Self::new(1200.0, Duration::from_millis(100))
    }
}

impl Iterator for MarkChime {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.num_sample >= self.total_samples {
            return None;
        }

        let t = self.num_sample as f32 / SAMPLE_RATE as f32;
        let progress = self.num_sample as f32 / self.total_samples as f32;
        self.num_sample += 1;

        Some((2.0 * PI * self.freq * t).sin() * self.gain_at(progress))
    }
}

impl Source for MarkChime {
    fn current_frame_len(&self) -> Option<usize> {
        Some(self.total_samples - self.num_sample)
    }

    fn channels(&self) -> u16 {
        1 // Mono
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_nanos(
            self.total_samples as u64 * 1_000_000_000 / SAMPLE_RATE as u64,
        ))
    }
}
