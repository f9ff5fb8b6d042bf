use chrono::Local;

use crate::{
    settings::SettingsStore,
    timer::{format_elapsed, ChronometerController},
};

const ENABLE_LOGS: bool = true;

use crate::log_warn;

pub const HELP: &str = "\
commands:
  start               start the clock
  pause               pause the clock
  reset               stop and zero the clock (laps are kept)
  mark [note]         record a lap at the current time
  offset <ms>         set the display calibration offset
  offset reset        clear the calibration offset
  sound on|off        toggle the mark chime
  status              show the clock
  laps                list recorded laps, newest first
  stats               show lap statistics
  export              write laps to chronometer_<ms>.csv
  json                dump the full state as JSON
  help                show this help
  quit                stop the clock and exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Start,
    Pause,
    Reset,
    Mark(String),
    Offset(String),
    ResetOffset,
    Sound(bool),
    Status,
    Laps,
    Stats,
    Export,
    Json,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Reply(String),
    Quit,
}

pub fn parse_command(line: &str) -> Result<ShellCommand, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word.to_ascii_lowercase().as_str() {
        "start" => Ok(ShellCommand::Start),
        "pause" | "stop" => Ok(ShellCommand::Pause),
        "reset" => Ok(ShellCommand::Reset),
        "mark" => Ok(ShellCommand::Mark(rest.to_string())),
        "offset" if rest.eq_ignore_ascii_case("reset") => Ok(ShellCommand::ResetOffset),
        "offset" => Ok(ShellCommand::Offset(rest.to_string())),
        "sound" => match rest.to_ascii_lowercase().as_str() {
            "on" => Ok(ShellCommand::Sound(true)),
            "off" => Ok(ShellCommand::Sound(false)),
            other => Err(format!("expected 'sound on' or 'sound off', got '{other}'")),
        },
        "status" | "" => Ok(ShellCommand::Status),
        "laps" => Ok(ShellCommand::Laps),
        "stats" => Ok(ShellCommand::Stats),
        "export" => Ok(ShellCommand::Export),
        "json" => Ok(ShellCommand::Json),
        "help" | "?" => Ok(ShellCommand::Help),
        "quit" | "exit" => Ok(ShellCommand::Quit),
        other => Err(format!("unknown command '{other}' (try 'help')")),
    }
}

pub async fn execute(
    command: ShellCommand,
    controller: &ChronometerController,
    settings: &SettingsStore,
) -> Result<Outcome, String> {
    let reply = match command {
        ShellCommand::Start => {
            controller.start().await;
            status_line(controller).await
        }
        ShellCommand::Pause => {
            controller.pause().await;
            status_line(controller).await
        }
        ShellCommand::Reset => {
            controller.reset().await;
            status_line(controller).await
        }
        ShellCommand::Mark(note) => {
            let resolution = controller.clock().await.resolution;
            match controller.mark(&note).await {
                Some(m) => format!("marked {}  {}", format_elapsed(m.duration, resolution), m.note),
                None => "nothing to mark yet".to_string(),
            }
        }
        ShellCommand::Offset(input) => {
            let clock = controller.set_calibration_input(&input).await;
            describe_offset(clock.calibration_offset_ms)
        }
        ShellCommand::ResetOffset => {
            let clock = controller.reset_calibration().await;
            describe_offset(clock.calibration_offset_ms)
        }
        ShellCommand::Sound(enabled) => {
            controller.set_sound(enabled).await;
            if let Err(err) = settings.update_sound(enabled) {
                log_warn!("Failed to persist sound setting: {err:#}");
            }
            if enabled {
                "mark chime enabled".to_string()
            } else {
                "mark chime disabled".to_string()
            }
        }
        ShellCommand::Status => status_line(controller).await,
        ShellCommand::Laps => laps_table(controller).await,
        ShellCommand::Stats => {
            let resolution = controller.clock().await.resolution;
            let stats = controller.statistics().await;
            let (average, min, max) = stats.formatted(resolution);
            format!(
                "count:   {}\naverage: {}\nmin:     {}\nmax:     {}",
                stats.count, average, min, max
            )
        }
        ShellCommand::Export => {
            let dir = settings.get().export_dir;
            match controller.export(&dir).await.map_err(|e| format!("{e:#}"))? {
                Some(path) => format!("exported to {}", path.display()),
                None => "nothing to export".to_string(),
            }
        }
        ShellCommand::Json => {
            let snapshot = controller.get_snapshot().await;
            serde_json::to_string_pretty(&snapshot).map_err(|e| e.to_string())?
        }
        ShellCommand::Help => HELP.to_string(),
        ShellCommand::Quit => {
            controller.shutdown().await;
            return Ok(Outcome::Quit);
        }
    };

    Ok(Outcome::Reply(reply))
}

async fn status_line(controller: &ChronometerController) -> String {
    let clock = controller.clock().await;
    let badge = if clock.running { "RUNNING" } else { "PAUSED" };
    format!(
        "{}  [{}]  {}",
        Local::now().format("%d.%m.%Y, %H:%M:%S"),
        badge,
        format_elapsed(clock.displayed_ms(), clock.resolution)
    )
}

async fn laps_table(controller: &ChronometerController) -> String {
    let resolution = controller.clock().await.resolution;
    let laps = controller.laps().await;
    if laps.is_empty() {
        return "no measurements yet".to_string();
    }

    laps.iter()
        .map(|m| {
            let at = m.captured_at().with_timezone(&Local);
            format!(
                "{}  {}  {}",
                format_elapsed(m.duration, resolution),
                at.format("%H:%M:%S"),
                m.note
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn describe_offset(offset_ms: i64) -> String {
    if offset_ms > 0 {
        format!("calibration offset: +{offset_ms} ms")
    } else {
        format!("calibration offset: {offset_ms} ms")
    }
}
