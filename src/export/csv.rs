use chrono::{DateTime, Local, TimeZone, Utc};
use std::fmt::Display;

use crate::models::Measurement;
use crate::timer::{format_elapsed, Resolution};

const HEADERS: [&str; 4] = ["Mark time", "Duration (ms)", "Note", "Date and time"];
const BOM: char = '\u{FEFF}';
const DATETIME_FORMAT: &str = "%d.%m.%Y, %H:%M:%S";

/// Render the lap log as CSV using the local time zone for the date column.
/// Returns `None` for an empty log.
pub fn render_csv(log: &[Measurement], resolution: Resolution) -> Option<String> {
    render_csv_in(log, resolution, &Local)
}

pub fn render_csv_in<Tz>(log: &[Measurement], resolution: Resolution, tz: &Tz) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if log.is_empty() {
        return None;
    }

    let mut lines = Vec::with_capacity(log.len() + 1);
    lines.push(HEADERS.join(","));
    for m in log {
        lines.push(
            [
                format_elapsed(m.duration, resolution),
                m.duration.to_string(),
                quote(&m.note),
                locale_datetime(m.captured_at(), tz),
            ]
            .join(","),
        );
    }

    let mut document = String::new();
    document.push(BOM);
    document.push_str(&lines.join("\n"));
    Some(document)
}

/// Wrap in double quotes, doubling any quote inside.
pub fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

pub fn locale_datetime<Tz>(at: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.with_timezone(tz).format(DATETIME_FORMAT).to_string()
}
