use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::timer::Resolution;

pub const SETTINGS_PATH_ENV: &str = "CHRONOMETER_SETTINGS";
pub const RESOLUTION_ENV: &str = "CHRONOMETER_RESOLUTION";
const DEFAULT_SETTINGS_FILE: &str = "chronometer.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ChronometerSettings {
    pub resolution: Resolution,
    pub sound_enabled: bool,
    pub export_dir: PathBuf,
}

impl Default for ChronometerSettings {
    fn default() -> Self {
        Self {
            resolution: Resolution::Millisecond,
            sound_enabled: true,
            export_dir: PathBuf::from("."),
        }
    }
}

/// Where settings live: `$CHRONOMETER_SETTINGS`, else `chronometer.json` in
/// the working directory.
pub fn default_settings_path() -> PathBuf {
    std::env::var_os(SETTINGS_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE))
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<ChronometerSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let mut data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring malformed settings in {}: {err}", path.display());
                ChronometerSettings::default()
            })
        } else {
            ChronometerSettings::default()
        };

        if let Ok(value) = std::env::var(RESOLUTION_ENV) {
            match value.parse::<Resolution>() {
                Ok(resolution) => data.resolution = resolution,
                Err(err) => warn!("Ignoring {RESOLUTION_ENV}: {err}"),
            }
        }

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> ChronometerSettings {
        self.read().clone()
    }

    pub fn update_sound(&self, enabled: bool) -> Result<()> {
        let mut guard = self.write();
        guard.sound_enabled = enabled;
        self.persist(&guard)
    }

    pub fn update_export_dir(&self, dir: PathBuf) -> Result<()> {
        let mut guard = self.write();
        guard.export_dir = dir;
        self.persist(&guard)
    }

    fn read(&self) -> RwLockReadGuard<'_, ChronometerSettings> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, ChronometerSettings> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, data: &ChronometerSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
