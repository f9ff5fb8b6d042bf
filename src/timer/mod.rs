pub mod commands;
pub mod controller;
pub mod format;
pub mod resolution;
pub mod state;

pub use controller::{ChronometerController, ChronometerSnapshot};
pub use format::{format_elapsed, format_fractional};
pub use resolution::Resolution;
pub use state::{apply, parse_calibration_offset, ChronometerState, ClockEvent, ClockState};
