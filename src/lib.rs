pub mod audio;
pub mod export;
pub mod laps;
pub mod models;
pub mod settings;
pub mod timer;
mod utils;

use std::sync::Arc;

use anyhow::Context;
use audio::AudioEngineHandle;
use log::{error, info};
use settings::{default_settings_path, SettingsStore};
use tokio::io::{AsyncBufReadExt, BufReader};
use timer::{
    commands::{execute, parse_command, Outcome, HELP},
    ChronometerController,
};

pub use laps::{LapLog, LapStatistics};
pub use models::Measurement;
pub use timer::{format_elapsed, ChronometerState, ClockEvent, Resolution};

pub fn run() -> anyhow::Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("Chronometer starting up...");

    let settings = SettingsStore::new(default_settings_path())?;
    let initial = settings.get();
    info!(
        "Loaded settings from {} (resolution {}, sound {})",
        settings.path().display(),
        initial.resolution,
        if initial.sound_enabled { "on" } else { "off" }
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(async move {
        let audio = Arc::new(AudioEngineHandle::new());
        let controller =
            ChronometerController::new(initial.resolution, initial.sound_enabled, audio);

        println!("{HELP}");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(err) => {
                    error!("Failed to read input: {err}");
                    break;
                }
            };

            let command = match parse_command(&line) {
                Ok(command) => command,
                Err(message) => {
                    eprintln!("{message}");
                    continue;
                }
            };

            match execute(command, &controller, &settings).await {
                Ok(Outcome::Reply(text)) => println!("{text}"),
                Ok(Outcome::Quit) => break,
                Err(message) => eprintln!("error: {message}"),
            }
        }

        controller.shutdown().await;
        info!("Chronometer shut down");
        Ok(())
    })
}
