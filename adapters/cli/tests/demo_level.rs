use std::{path::Path, process::Command};

use serde_json::Value;

fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_dungeon-keeper"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to launch dungeon-keeper")
}

#[test]
fn demo_level_replays_to_a_json_summary() {
    let level = Path::new(env!("CARGO_MANIFEST_DIR")).join("levels/demo.toml");
    let output = run_cli(&[
        "--level",
        level.to_str().expect("utf-8 path"),
        "--json",
        "--log-level",
        "warn",
    ]);
    assert!(
        output.status.success(),
        "demo level should replay cleanly: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let summary: Value = serde_json::from_slice(&output.stdout).expect("summary is json");
    assert_eq!(summary["level"], "Demo Dungeon");
    assert_eq!(summary["columns"], 10);
    assert_eq!(summary["rows"], 7);
    assert_eq!(summary["rooms_claimed"], 1);
    assert_eq!(
        summary["room_types"],
        serde_json::json!(["treasury", "bridge"])
    );

    let players = summary["players"].as_array().expect("players listed");
    assert_eq!(players.len(), 2);
    let keeper_gold = players[0]["gold"].as_u64().expect("gold is a number");
    assert!(keeper_gold >= 1_000, "keeper keeps its starting gold");

    let paths = summary["paths"].as_array().expect("paths listed");
    assert_eq!(paths.len(), 3);
    assert_eq!(paths[0]["steps"], 4);
}

#[test]
fn missing_level_reports_an_error() {
    let output = run_cli(&["--level", "levels/does-not-exist.toml"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("failed to read level manifest"),
        "unexpected error output: {stderr}"
    );
}
