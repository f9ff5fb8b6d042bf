pub mod csv;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::info;

use crate::models::Measurement;
use crate::timer::Resolution;

pub use self::csv::{render_csv, render_csv_in};

/// `chronometer_<ms since epoch>.csv`
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("chronometer_{}.csv", now.timestamp_millis())
}

/// Write the lap log to a timestamped CSV file under `dir`.
///
/// Returns `Ok(None)` without touching the filesystem when there is nothing
/// to export.
pub fn export_to_dir(
    dir: &Path,
    log: &[Measurement],
    resolution: Resolution,
    now: DateTime<Utc>,
) -> Result<Option<PathBuf>> {
    let Some(document) = render_csv(log, resolution) else {
        return Ok(None);
    };

    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory {}", dir.display()))?;

    let path = dir.join(export_file_name(now));
    fs::write(&path, document.as_bytes())
        .with_context(|| format!("Failed to write export to {}", path.display()))?;

    info!("Exported {} measurements to {}", log.len(), path.display());
    Ok(Some(path))
}
