use crate::scenario::{PassSpec, Scenario};
use aidroute_core::{plan_table, RoutingConfig, TablePlan};
use serde_json::{json, Value};
use std::path::Path;

/// Table a pass would produce, ignoring what the controller already holds
fn plan_pass(config: &RoutingConfig, pass: &PassSpec) -> TablePlan {
    let (aids, invalid) = pass.parsed_aids();
    let mut plan = plan_table(config, &aids);
    plan.defects.splice(0..0, invalid);
    plan
}

fn pass_json(index: usize, config: &RoutingConfig, planned: &TablePlan) -> Value {
    let defects: Vec<String> = planned.defects.iter().map(ToString::to_string).collect();
    match &planned.result {
        Ok(built) => {
            let entries: Vec<Value> = built
                .entries
                .iter()
                .map(|(aid, entry)| {
                    json!({
                        "aid": aid.to_string(),
                        "route": entry.route,
                        "qualifier": entry.qualifier,
                        "power": entry.power,
                    })
                })
                .collect();
            json!({
                "pass": index,
                "default_route": built.entries.default_route(),
                "fallback_used": planned.fallback_used(),
                "table_bytes": built.table_bytes,
                "max_table_bytes": config.max_table_bytes,
                "entries": entries,
                "defects": defects,
            })
        }
        Err(err) => json!({
            "pass": index,
            "error": err.to_string(),
            "code": err.failure_code().as_raw(),
            "defects": defects,
        }),
    }
}

fn pass_text(index: usize, config: &RoutingConfig, planned: &TablePlan) -> String {
    let mut out = format!("Pass {index}\n");
    match &planned.result {
        Ok(built) => {
            out.push_str(&format!(
                "  default route {} | {}/{} bytes | {} entries\n",
                built.entries.default_route(),
                built.table_bytes,
                config.max_table_bytes,
                built.entries.len()
            ));
            for (aid, entry) in built.entries.iter() {
                let shown = if aid.is_empty() {
                    "(empty)".to_string()
                } else {
                    aid.to_string()
                };
                out.push_str(&format!(
                    "    {shown:<34} -> {} power {}\n",
                    entry.route, entry.power
                ));
            }
        }
        Err(err) => out.push_str(&format!("  FAILED: {err}\n")),
    }
    for defect in &planned.defects {
        out.push_str(&format!("  dropped: {defect}\n"));
    }
    out
}

pub fn run(path: &Path, as_json: bool) -> anyhow::Result<()> {
    let scenario = Scenario::load(path)?;
    let planned: Vec<TablePlan> = scenario
        .passes
        .iter()
        .map(|pass| plan_pass(&scenario.config, pass))
        .collect();

    if as_json {
        let passes: Vec<Value> = planned
            .iter()
            .enumerate()
            .map(|(i, p)| pass_json(i, &scenario.config, p))
            .collect();
        println!("{}", serde_json::to_string_pretty(&json!({ "passes": passes }))?);
    } else {
        for (i, p) in planned.iter().enumerate() {
            print!("{}", pass_text(i, &scenario.config, p));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> Scenario {
        Scenario::parse(
            r#"{
                "config": {
                    "max_table_bytes": 30,
                    "secure_elements": { "ese": [134] },
                    "routes": { "default_route": 134 }
                },
                "passes": [
                    {
                        "aids": {
                            "A000000001": { "on_host": true },
                            "A000000002": { "on_host": true },
                            "A000000003": { "on_host": true },
                            "A000000004": { "on_host": false, "off_host_se": "eSE1" }
                        }
                    },
                    {
                        "aids": {
                            "A0000000010203040506070809101112": { "on_host": false, "off_host_se": "eSE1" },
                            "A0000000020203040506070809101112": { "on_host": false, "off_host_se": "eSE1" },
                            "A0000000030203040506070809101112": { "on_host": true },
                            "A0000000040203040506070809101112": { "on_host": true }
                        }
                    }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_plan_falls_back_to_host() {
        let scenario = scenario();
        let planned = plan_pass(&scenario.config, &scenario.passes[0]);
        let value = pass_json(0, &scenario.config, &planned);
        assert_eq!(value["default_route"], 0);
        assert_eq!(value["fallback_used"], true);
        assert_eq!(value["table_bytes"], 13);
        assert_eq!(value["entries"].as_array().unwrap().len(), 2);
        // The synthetic empty AID has no marker
        assert_eq!(value["entries"][0]["aid"], "");
        assert_eq!(value["entries"][1]["aid"], "A000000004");
    }

    #[test]
    fn test_plan_reports_overflow() {
        let scenario = scenario();
        let planned = plan_pass(&scenario.config, &scenario.passes[1]);
        let value = pass_json(1, &scenario.config, &planned);
        assert_eq!(value["code"], 1);
        assert!(value["error"].as_str().unwrap().contains("overflow"));

        let text = pass_text(1, &scenario.config, &planned);
        assert!(text.contains("FAILED"));
    }

    #[test]
    fn test_plan_text_lists_entries() {
        let scenario = scenario();
        let planned = plan_pass(&scenario.config, &scenario.passes[0]);
        let text = pass_text(0, &scenario.config, &planned);
        assert!(text.starts_with("Pass 0\n  default route 0x00 | 13/30 bytes | 2 entries\n"));
        assert!(text.contains("(empty)"));
        assert!(text.contains("A000000004"));
    }
}
