//! End-to-end CLI integration tests for the `tk` binary.
//!
//! Each test creates its own temporary directory, initializes a tracker,
//! and exercises the `tk` binary as a subprocess via `assert_cmd`.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a `Command` targeting the cargo-built `tk` binary, isolated from
/// the caller's environment.
fn tk(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tk").unwrap();
    cmd.current_dir(dir)
        .env_remove("TICKETRY_DIR")
        .env_remove("TICKETRY_PROJECT")
        .env_remove("TICKETRY_ACTOR")
        .env_remove("TICKETRY_JSON")
        .env_remove("TICKETRY_DB")
        .env("TK_ACTOR", "tester");
    cmd
}

/// Initialize a fresh tracker in a temp directory and return the handle.
fn init_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    tk(tmp.path()).args(["init", "--quiet"]).assert().success();
    tmp
}

/// Run a command with `--json` and parse its stdout.
fn run_json(tmp: &TempDir, args: &[&str]) -> serde_json::Value {
    let mut all = args.to_vec();
    all.push("--json");
    let output = tk(tmp.path()).args(&all).output().unwrap();
    assert!(
        output.status.success(),
        "{:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

/// Create an issue and return its number.
fn create_issue(tmp: &TempDir, title: &str, extra_args: &[&str]) -> i64 {
    let mut args = vec!["create", title];
    args.extend_from_slice(extra_args);
    run_json(tmp, &args)["number"].as_i64().unwrap()
}

/// Names of the effective fields in a JSON field list.
fn field_names(fields: &serde_json::Value) -> Vec<String> {
    fields
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap().to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------

#[test]
fn init_writes_config_workflow_and_database() {
    let tmp = init_project();
    let dir = tmp.path().join(".ticketry");
    assert!(dir.join("config.yaml").exists());
    assert!(dir.join("workflow.yaml").exists());
    assert!(dir.join("ticketry.db").exists());
    assert!(dir.join(".gitignore").exists());
}

#[test]
fn init_twice_requires_force() {
    let tmp = init_project();
    tk(tmp.path())
        .args(["init", "--quiet"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
    tk(tmp.path())
        .args(["init", "--quiet", "--force"])
        .assert()
        .success();
}

#[test]
fn explicit_dir_is_the_tracker_directory() {
    let tmp = TempDir::new().unwrap();
    let tracker = tmp.path().join("tracker");
    let dir = tracker.to_str().unwrap();

    tk(tmp.path())
        .args(["init", "--quiet", "--dir", dir])
        .assert()
        .success();
    assert!(tracker.join("ticketry.db").exists());
    assert!(!tracker.join(".ticketry").exists());

    tk(tmp.path())
        .args(["create", "Hello", "--dir", dir])
        .assert()
        .success()
        .stdout(predicate::str::contains("main#1 [Open] Hello"));
}

#[test]
fn commands_outside_a_tracker_fail() {
    let tmp = TempDir::new().unwrap();
    tk(tmp.path())
        .args(["list", "--dir", tmp.path().join("missing").to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

// ---------------------------------------------------------------------------
// Field lifecycle
// ---------------------------------------------------------------------------

#[test]
fn create_with_fields_and_show() {
    let tmp = init_project();
    let number = create_issue(
        &tmp,
        "Crash on save",
        &["-f", "Severity=High", "-f", "Labels=ui", "-f", "Labels=api", "-d", "Steps inside"],
    );
    assert_eq!(number, 1);

    let shown = run_json(&tmp, &["show", "1"]);
    let issue = &shown[0];
    assert_eq!(issue["reference"], "main#1");
    assert_eq!(issue["state"], "Open");
    assert_eq!(issue["submitter"], "tester");
    assert_eq!(issue["description"], "Steps inside");
    assert_eq!(field_names(&issue["fields"]), vec!["Severity", "Labels"]);
    assert_eq!(issue["fields"][0]["type"], "Choice");
    assert_eq!(issue["fields"][0]["values"], serde_json::json!(["High"]));
    assert_eq!(issue["fields"][1]["values"], serde_json::json!(["api", "ui"]));

    tk(tmp.path())
        .args(["show", "#1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("main#1 Crash on save"))
        .stdout(predicate::str::contains("Labels: api, ui"));
}

#[test]
fn set_field_and_clear() {
    let tmp = init_project();
    create_issue(&tmp, "Slow list", &[]);

    let out = run_json(&tmp, &["set-field", "1", "Estimate", "5"]);
    assert_eq!(out["issue"], "main#1");
    assert_eq!(field_names(&out["fields"]), vec!["Estimate"]);
    assert_eq!(out["fields"][0]["value"]["type"], "integer");
    assert_eq!(out["fields"][0]["value"]["value"], 5);
    assert_eq!(out["fields"][0]["ordinal"], 5);

    tk(tmp.path())
        .args(["fields", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Estimate: 5"));

    let out = run_json(&tmp, &["set-field", "1", "Estimate"]);
    assert_eq!(out["fields"][0]["values"], serde_json::json!([]));
    assert!(out["fields"][0].get("value").is_none());

    let shown = run_json(&tmp, &["show", "1"]);
    assert_eq!(shown[0]["version"], 2);
    assert_eq!(shown[0]["last_activity"]["description"], "changed \"Estimate\"");
}

#[test]
fn transition_hides_and_restores_fields() {
    let tmp = init_project();
    create_issue(&tmp, "Wrong totals", &["-f", "Severity=Low", "-f", "Estimate=3"]);

    let out = run_json(&tmp, &["transition", "1", "Closed", "-f", "Resolution=fixed in 1.2"]);
    assert_eq!(out["state"], "Closed");
    assert_eq!(field_names(&out["fields"]), vec!["Severity", "Resolution"]);

    let excluded = run_json(&tmp, &["excluded", "1"]);
    assert_eq!(excluded["state"], "Closed");
    assert_eq!(
        excluded["excluded"],
        serde_json::json!(["due", "estimate", "labels"])
    );

    let out = run_json(&tmp, &["transition", "1", "Open"]);
    assert_eq!(field_names(&out["fields"]), vec!["Severity", "Estimate"]);

    let excluded = run_json(&tmp, &["excluded", "1", "Open"]);
    assert_eq!(
        excluded["excluded"],
        serde_json::json!(["due", "labels", "resolution"])
    );
}

#[test]
fn transition_after_field_removed_from_workflow() {
    let tmp = init_project();
    create_issue(&tmp, "Old estimate", &["-f", "Estimate=3", "-f", "Severity=High"]);

    let path = tmp.path().join(".ticketry/workflow.yaml");
    let yaml = std::fs::read_to_string(&path)
        .unwrap()
        .replace("Severity, Labels, Estimate, Due", "Severity, Labels, Due")
        .replace(
            "  - name: Estimate\n    type: Integer\n    description: Estimated effort in hours\n",
            "",
        );
    assert!(!yaml.contains("Estimate"));
    std::fs::write(&path, yaml).unwrap();

    let out = run_json(&tmp, &["transition", "1", "Closed"]);
    assert_eq!(out["state"], "Closed");
    assert_eq!(field_names(&out["fields"]), vec!["Severity"]);
}

#[test]
fn transition_to_unknown_state_fails() {
    let tmp = init_project();
    create_issue(&tmp, "Anything", &[]);
    tk(tmp.path())
        .args(["transition", "1", "Archived"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Archived"));
}

#[test]
fn invalid_field_input_is_rejected() {
    let tmp = init_project();
    create_issue(&tmp, "Anything", &[]);

    tk(tmp.path())
        .args(["set-field", "1", "Component", "ui"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Component"));
    tk(tmp.path())
        .args(["set-field", "1", "Severity", "Urgent"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Urgent"));
    tk(tmp.path())
        .args(["set-field", "1", "Severity", "High", "Low"])
        .assert()
        .failure();
    tk(tmp.path())
        .args(["set-field", "1", "Due", "next week"])
        .assert()
        .failure();

    let shown = run_json(&tmp, &["show", "1"]);
    assert_eq!(shown[0]["fields"], serde_json::json!([]));
    assert_eq!(shown[0]["version"], 0);
}

// ---------------------------------------------------------------------------
// Listing and search
// ---------------------------------------------------------------------------

#[test]
fn list_filters_by_state_and_field() {
    let tmp = init_project();
    create_issue(&tmp, "First", &["-f", "Labels=docs"]);
    create_issue(&tmp, "Second", &["-s", "In Progress"]);
    create_issue(&tmp, "Third", &["-f", "Labels=docs", "-f", "Labels=ui"]);

    let all = run_json(&tmp, &["list"]);
    assert_eq!(all.as_array().unwrap().len(), 3);

    let in_progress = run_json(&tmp, &["list", "-s", "In Progress"]);
    assert_eq!(in_progress.as_array().unwrap().len(), 1);
    assert_eq!(in_progress[0]["title"], "Second");

    let docs = run_json(&tmp, &["list", "-f", "Labels=docs"]);
    let numbers: Vec<i64> = docs
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["number"].as_i64().unwrap())
        .collect();
    assert_eq!(numbers, vec![1, 3]);

    tk(tmp.path())
        .args(["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("State"))
        .stdout(predicate::str::contains("Third"));
}

#[test]
fn list_search_matches_number_prefix_and_title() {
    let tmp = init_project();
    for title in ["Login fails", "Export to CSV", "Login page slow"] {
        create_issue(&tmp, title, &[]);
    }

    let found = run_json(&tmp, &["list", "--search", "login"]);
    let numbers: Vec<i64> = found
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["number"].as_i64().unwrap())
        .collect();
    assert_eq!(numbers, vec![3, 1]);

    let found = run_json(&tmp, &["list", "--search", "#2"]);
    assert_eq!(found[0]["title"], "Export to CSV");

    let found = run_json(&tmp, &["list", "--search", "pageslow"]);
    assert_eq!(found.as_array().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[test]
fn delete_requires_force() {
    let tmp = init_project();
    create_issue(&tmp, "Doomed", &[]);

    tk(tmp.path())
        .args(["delete", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    let out = run_json(&tmp, &["delete", "1", "--force"]);
    assert_eq!(out["deleted"], serde_json::json!(["main#1"]));

    tk(tmp.path())
        .args(["show", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("main#1"));
}

// ---------------------------------------------------------------------------
// Workflow and projects
// ---------------------------------------------------------------------------

#[test]
fn workflow_show_and_check() {
    let tmp = init_project();
    let wf = run_json(&tmp, &["workflow"]);
    assert_eq!(wf["states"][0]["name"], "Open");
    assert_eq!(wf["fields"][1]["allow-multiple"], true);

    tk(tmp.path())
        .args(["workflow", "--check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ok"));

    std::fs::write(
        tmp.path().join(".ticketry/workflow.yaml"),
        "states:\n  - name: Open\n    fields: [Ghost]\nfields: []\n",
    )
    .unwrap();
    tk(tmp.path())
        .args(["workflow", "--check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid workflow"));
}

#[test]
fn projects_number_independently() {
    let tmp = init_project();
    create_issue(&tmp, "Main issue", &[]);
    let number = create_issue(&tmp, "Web issue", &["--project", "web"]);
    assert_eq!(number, 1);

    let shown = run_json(&tmp, &["show", "web#1"]);
    assert_eq!(shown[0]["title"], "Web issue");

    let main = run_json(&tmp, &["list"]);
    assert_eq!(main.as_array().unwrap().len(), 1);
}

#[test]
fn missing_issue_is_reported_as_not_found() {
    let tmp = init_project();
    tk(tmp.path())
        .args(["show", "42"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("issue main#42 not found"));
}

#[test]
fn json_errors_are_reported_as_json() {
    let tmp = init_project();
    tk(tmp.path())
        .args(["show", "42", "--json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"error\""));
}

#[test]
fn json_errors_follow_configured_output() {
    let tmp = init_project();
    tk(tmp.path())
        .args(["show", "42"])
        .env("TICKETRY_JSON", "true")
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"error\""));

    std::fs::write(
        tmp.path().join(".ticketry/config.yaml"),
        "project: main\njson: true\n",
    )
    .unwrap();
    tk(tmp.path())
        .args(["show", "42"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"error\""));
}
