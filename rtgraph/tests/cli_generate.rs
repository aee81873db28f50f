//! CLI tests for `rtgraph init`, `validate` and `generate`.
//!
//! Spawns the binary inside a temp project and checks exit codes and the
//! files it writes.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use rtgraph::exit_codes;
use rtgraph::io::emitter::read_snapshot;
use rtgraph::io::init::{InitOptions, init_project};

fn rtgraph(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rtgraph"))
        .current_dir(dir)
        .args(args)
        .output()
        .expect("run rtgraph")
}

#[test]
fn init_then_generate_writes_sample_graph() {
    let temp = tempfile::tempdir().expect("tempdir");

    let init = rtgraph(temp.path(), &["init"]);
    assert_eq!(init.status.code(), Some(exit_codes::OK));
    assert!(temp.path().join("rtgraph.toml").is_file());

    let output = rtgraph(temp.path(), &["generate", "model.json"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Smart Home: 6 goals, 8 plans"), "stdout: {stdout}");

    let snapshot = read_snapshot(&temp.path().join("out").join("Smart_Home.json")).expect("read");
    assert_eq!(snapshot.roots, vec!["G1".to_string()]);
}

#[test]
fn second_init_without_force_fails() {
    let temp = tempfile::tempdir().expect("tempdir");
    init_project(temp.path(), &InitOptions { force: false }).expect("init");

    let output = rtgraph(temp.path(), &["init"]);
    assert_eq!(output.status.code(), Some(exit_codes::FAILURE));
    let forced = rtgraph(temp.path(), &["init", "--force"]);
    assert_eq!(forced.status.code(), Some(exit_codes::OK));
}

#[test]
fn validate_rejects_ill_formed_model_with_model_code() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(
        temp.path().join("bad.json"),
        r#"{"actors": [{"name": "A", "goals": [
            {"name": "G1: top", "root": true, "and": true,
             "decomposition": ["G1.1: a", "G1.2: b"]},
            {"name": "G1.1: a"},
            {"name": "G1.2: b"}
        ]}]}"#,
    )
    .expect("write model");

    let output = rtgraph(temp.path(), &["validate", "bad.json"]);
    assert_eq!(output.status.code(), Some(exit_codes::MODEL_REJECTED));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("must have a runtime annotation"), "stderr: {stderr}");
    assert!(stderr.contains("G1"), "stderr: {stderr}");
}

#[test]
fn schema_violation_is_not_a_model_rejection() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("bad.json"), r#"{"agents": []}"#).expect("write model");

    let output = rtgraph(temp.path(), &["validate", "bad.json"]);
    assert_eq!(output.status.code(), Some(exit_codes::FAILURE));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("schema validation failed"), "stderr: {stderr}");
}

#[test]
fn generate_honours_out_and_goal_flags() {
    let temp = tempfile::tempdir().expect("tempdir");
    init_project(temp.path(), &InitOptions { force: false }).expect("init");

    let output = rtgraph(
        temp.path(),
        &["generate", "model.json", "--out", "graphs", "--goal", "G1.3"],
    );
    assert_eq!(output.status.code(), Some(exit_codes::OK));

    let snapshot = read_snapshot(&temp.path().join("graphs").join("Smart_Home.json")).expect("read");
    let plans: Vec<&str> = snapshot.plans.iter().map(|plan| plan.el_id.as_str()).collect();
    assert_eq!(plans, vec!["T4"]);
    assert!(!temp.path().join("out").exists());
}

#[test]
fn invalid_goal_flag_fails_before_reading_the_model() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = rtgraph(temp.path(), &["generate", "missing.json", "--goal", "T1"]);
    assert_eq!(output.status.code(), Some(exit_codes::FAILURE));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not a goal identifier"), "stderr: {stderr}");
}
