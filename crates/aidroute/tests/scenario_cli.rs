use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn demo(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../demos")
        .join(name)
}

fn aidroute(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_aidroute"))
        .args(args)
        .env("AIDROUTE_HOME", home)
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_plan_json_shows_fallback_and_overflow() {
    let home = tempfile::TempDir::new().unwrap();
    let scenario = demo("fallback.json");
    let output = aidroute(home.path(), &["plan", scenario.to_str().unwrap(), "--json"]);
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let passes = value["passes"].as_array().unwrap();
    assert_eq!(passes.len(), 2);
    assert_eq!(passes[0]["default_route"], 0);
    assert_eq!(passes[0]["fallback_used"], true);
    assert_eq!(passes[0]["table_bytes"], 13);
    assert_eq!(passes[1]["code"], 1);
}

#[test]
fn test_apply_records_passes() {
    let home = tempfile::TempDir::new().unwrap();
    let scenario = demo("wallet.json");
    let output = aidroute(home.path(), &["apply", scenario.to_str().unwrap()]);
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("Pass 0: committed"));
    assert!(text.contains("Pass 1: unchanged"));
    assert!(text.contains("Pass 2: committed"));
    assert!(text.contains("Pass 3: committed"));
    assert!(text.contains("Routing table:"));

    let log = std::fs::read_to_string(home.path().join("passes.jsonl")).unwrap();
    assert_eq!(log.lines().count(), 4);
    assert!(home.path().join("last_snapshot.json").exists());

    let history = aidroute(home.path(), &["history", "--stats"]);
    assert!(history.status.success());
    assert!(stdout(&history).contains("Total passes: 4"));
}

#[test]
fn test_apply_without_record() {
    let home = tempfile::TempDir::new().unwrap();
    let scenario = demo("prefix_only.json");
    let output = aidroute(home.path(), &["apply", scenario.to_str().unwrap(), "--no-record"]);
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("dropped: AID A00000000301#"));
    assert!(!home.path().join("passes.jsonl").exists());
}

#[test]
fn test_missing_scenario_fails() {
    let home = tempfile::TempDir::new().unwrap();
    let output = aidroute(home.path(), &["plan", "/nonexistent/scenario.json"]);
    assert!(!output.status.success());
}
