use aidroute_telemetry::{PassLog, PassRecord, PassStats, Paths};
use tracing::warn;

#[derive(Default)]
struct HistoryFilter {
    scenario: Option<String>,
    hours: Option<u64>,
}

fn filter_passes<'a>(passes: &'a [PassRecord], filter: &HistoryFilter) -> Vec<&'a PassRecord> {
    let cutoff = filter
        .hours
        .map(|h| chrono::Utc::now() - chrono::Duration::hours(h as i64));

    passes
        .iter()
        .filter(|p| cutoff.map_or(true, |cutoff| p.timestamp >= cutoff))
        .filter(|p| {
            filter
                .scenario
                .as_ref()
                .map_or(true, |s| &p.scenario == s)
        })
        .collect()
}

fn format_pass(pass: &PassRecord) -> String {
    let route = pass
        .default_route
        .map(|r| format!("0x{r:02x}"))
        .unwrap_or_else(|| "-".to_string());
    let mut line = format!(
        "  {} | {} | {:?} route:{} bytes:{}/{}",
        pass.timestamp.format("%Y-%m-%d %H:%M"),
        pass.scenario,
        pass.outcome,
        route,
        pass.table_bytes,
        pass.max_table_bytes,
    );
    if pass.fallback_used {
        line.push_str(" fallback");
    }
    if !pass.defects.is_empty() {
        line.push_str(&format!(" dropped:{}", pass.defects.len()));
    }
    line
}

pub fn run(
    stats: bool,
    scenario: Option<&str>,
    hours: Option<u64>,
    limit: usize,
) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let log = PassLog::open(&paths);
    let contents = log.read()?;
    if contents.skipped > 0 {
        warn!(skipped = contents.skipped, path = %log.path().display(), "ignoring unreadable pass records");
    }
    let passes = contents.records;

    let filter = HistoryFilter {
        scenario: scenario.map(str::to_string),
        hours,
    };
    let filtered = filter_passes(&passes, &filter);

    if filtered.is_empty() {
        println!("No pass history");
        return Ok(());
    }

    if stats {
        let owned: Vec<PassRecord> = filtered.into_iter().cloned().collect();
        println!("{}", PassStats::from_records(&owned));
        return Ok(());
    }

    let recent: Vec<_> = filtered.into_iter().rev().take(limit).collect();
    println!("Recent Passes (last {})", recent.len());
    println!("=======================");
    for pass in recent {
        println!("{}", format_pass(pass));
    }
    Ok(())
}
