//! Pass records and file helpers for routing telemetry

mod pass_log;
mod paths;
mod stats;
mod types;

pub use pass_log::{write_snapshot, LogContents, PassLog};
pub use paths::Paths;
pub use stats::PassStats;
pub use types::{PassOutcome, PassRecord};
