pub mod measurement;

pub use measurement::{Measurement, DEFAULT_NOTE};
