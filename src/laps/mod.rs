pub mod recorder;
pub mod stats;

pub use recorder::LapLog;
pub use stats::LapStatistics;
