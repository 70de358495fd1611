//! Aggregates over recorded passes

use crate::types::{PassOutcome, PassRecord};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassStats {
    pub total: usize,
    pub committed: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub table_full: usize,
    pub fallbacks: usize,
    pub defects: usize,
    pub avg_table_bytes: f64,
    pub max_fill_ratio: f64,
}

impl PassStats {
    pub fn from_records(records: &[PassRecord]) -> Self {
        let mut stats = PassStats {
            total: records.len(),
            ..Self::default()
        };
        let mut accepted = 0usize;
        let mut accepted_bytes = 0usize;

        for record in records {
            match record.outcome {
                PassOutcome::Committed => stats.committed += 1,
                PassOutcome::Unchanged => stats.unchanged += 1,
                PassOutcome::TableFull => stats.table_full += 1,
                PassOutcome::Rejected | PassOutcome::Failed => {}
            }
            if record.outcome.is_failure() {
                stats.failed += 1;
                continue;
            }

            accepted += 1;
            accepted_bytes += record.table_bytes;
            if record.fallback_used {
                stats.fallbacks += 1;
            }
            stats.defects += record.defects.len();
            if record.max_table_bytes > 0 {
                let ratio = record.table_bytes as f64 / record.max_table_bytes as f64;
                stats.max_fill_ratio = stats.max_fill_ratio.max(ratio);
            }
        }

        if accepted > 0 {
            stats.avg_table_bytes = accepted_bytes as f64 / accepted as f64;
        }
        stats
    }
}

impl fmt::Display for PassStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total == 0 {
            return write!(f, "No passes to analyze.");
        }
        write!(
            f,
            "Total passes: {}\n\
             Committed: {}  Unchanged: {}  Failed: {} ({} table full)\n\
             Fallbacks to host: {}\n\
             Dropped entries: {}\n\
             Avg table size: {:.1} bytes\n\
             Peak fill: {:.0}%",
            self.total,
            self.committed,
            self.unchanged,
            self.failed,
            self.table_full,
            self.fallbacks,
            self.defects,
            self.avg_table_bytes,
            self.max_fill_ratio * 100.0
        )
    }
}
