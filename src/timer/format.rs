//! Fixed-width rendering of elapsed milliseconds.

use super::Resolution;

/// Format milliseconds as `HH:MM:SS.fff` or `HH:MM:SS.ff` depending on the
/// resolution. Hours are not wrapped.
pub fn format_elapsed(ms: u64, resolution: Resolution) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms / 60_000) % 60;
    let seconds = (ms / 1000) % 60;
    let millis = ms % 1000;

    match resolution {
        Resolution::Millisecond => {
            format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
        }
        Resolution::Centisecond => {
            format!(
                "{:02}:{:02}:{:02}.{:02}",
                hours,
                minutes,
                seconds,
                millis / 10
            )
        }
    }
}

/// Format a fractional millisecond value (an averaged duration), truncating
/// toward zero first. Negative and NaN inputs render as zero.
pub fn format_fractional(ms: f64, resolution: Resolution) -> String {
    let whole = if ms.is_finite() && ms > 0.0 {
        ms.trunc() as u64
    } else if ms == f64::INFINITY {
        u64::MAX
    } else {
        0
    };
    format_elapsed(whole, resolution)
}
