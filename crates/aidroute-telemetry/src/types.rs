//! Telemetry record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassOutcome {
    Committed,
    Unchanged,
    TableFull,
    Rejected,
    Failed,
}

impl PassOutcome {
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            PassOutcome::TableFull | PassOutcome::Rejected | PassOutcome::Failed
        )
    }
}

/// One routing pass as seen from the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassRecord {
    pub pass_id: String,
    pub timestamp: DateTime<Utc>,
    pub scenario: String,
    pub outcome: PassOutcome,
    /// Chosen default route; absent when the pass failed before choosing one
    #[serde(default)]
    pub default_route: Option<u8>,
    #[serde(default)]
    pub table_bytes: usize,
    pub max_table_bytes: usize,
    #[serde(default)]
    pub entry_count: usize,
    #[serde(default)]
    pub fallback_used: bool,
    #[serde(default)]
    pub defects: Vec<String>,
}

impl PassRecord {
    /// Id derived from the timestamp and the pass position in its scenario
    pub fn make_id(timestamp: DateTime<Utc>, index: usize) -> String {
        format!("{}-{index}", timestamp.format("%Y%m%dT%H%M%S%.3f"))
    }
}
