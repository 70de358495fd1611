use crate::scenario::{scenario_name, Scenario};
use aidroute_core::{AidRoutingManager, ConfigureOutcome, ConfigureStatus, RoutingError};
use aidroute_nfcc::{ControllerEvent, SimulatedController};
use aidroute_telemetry::{write_snapshot, PassLog, PassOutcome, PassRecord, Paths};
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::warn;

type PassResult = Result<ConfigureOutcome, RoutingError>;

fn outcome_kind(result: &PassResult) -> PassOutcome {
    match result {
        Ok(o) if o.status == ConfigureStatus::Committed => PassOutcome::Committed,
        Ok(_) => PassOutcome::Unchanged,
        Err(RoutingError::TableOverflow { .. }) => PassOutcome::TableFull,
        Err(RoutingError::CommitRejected { .. }) => PassOutcome::Rejected,
        Err(RoutingError::UnknownCommitFailure { .. }) => PassOutcome::Failed,
    }
}

fn record_for(
    scenario: &str,
    index: usize,
    max_table_bytes: usize,
    result: &PassResult,
    timestamp: DateTime<Utc>,
) -> PassRecord {
    let mut record = PassRecord {
        pass_id: PassRecord::make_id(timestamp, index),
        timestamp,
        scenario: scenario.to_string(),
        outcome: outcome_kind(result),
        default_route: None,
        table_bytes: 0,
        max_table_bytes,
        entry_count: 0,
        fallback_used: false,
        defects: Vec::new(),
    };
    if let Ok(outcome) = result {
        record.default_route = Some(outcome.default_route.0);
        record.table_bytes = outcome.table_bytes;
        record.entry_count = outcome.entry_count;
        record.fallback_used = outcome.fallback_used;
        record.defects = outcome.defects.iter().map(ToString::to_string).collect();
    }
    record
}

fn describe(index: usize, result: &PassResult) -> String {
    match result {
        Ok(outcome) => {
            let status = match outcome.status {
                ConfigureStatus::Committed => "committed",
                ConfigureStatus::Unchanged => "unchanged",
            };
            let mut line = format!(
                "Pass {index}: {status} | default route {} | {} bytes | {} entries",
                outcome.default_route, outcome.table_bytes, outcome.entry_count
            );
            if outcome.fallback_used {
                line.push_str(" | fell back");
            }
            for defect in &outcome.defects {
                line.push_str(&format!("\n  dropped: {defect}"));
            }
            line
        }
        Err(err) => format!(
            "Pass {index}: failed (code {}) | {err}",
            err.failure_code().as_raw()
        ),
    }
}

pub fn run(path: &Path, record: bool) -> anyhow::Result<()> {
    let scenario = Scenario::load(path)?;
    let name = scenario_name(path);
    let paths = if record { Some(Paths::new()?) } else { None };
    let log = paths.as_ref().map(PassLog::open);

    let manager = AidRoutingManager::new(SimulatedController::new(scenario.controller));

    for (index, pass) in scenario.passes.iter().enumerate() {
        if pass.clear_before
            && manager.with_transport(SimulatedController::power_cycle) == ControllerEvent::TableCleared
        {
            manager.report_table_cleared();
        }

        let result = manager.resolve_and_configure_raw(
            &scenario.config,
            pass.aids.iter().map(|(raw, intent)| (raw.as_str(), intent.clone())),
            pass.force,
            pass.override_pass,
        );
        println!("{}", describe(index, &result));

        if let Some(log) = &log {
            let entry = record_for(&name, index, scenario.config.max_table_bytes, &result, Utc::now());
            if let Err(err) = log.append(&entry) {
                warn!(error = %err, "could not record pass");
            }
        }
    }

    println!();
    print!("{}", manager.dump());

    if let Some(paths) = &paths {
        write_snapshot(&paths.snapshot_file(), &manager.snapshot())?;
    }
    Ok(())
}
