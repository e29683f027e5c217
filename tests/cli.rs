use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::tempdir;

fn stateport(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("stateport").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("STATEPORT_DATA_DIR")
        .arg("--data-dir")
        .arg(data_dir)
        .arg("--json")
        .write_stdin("");
    cmd
}

fn write_json(path: &Path, value: &Value) {
    fs::write(path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
}

fn read_json(path: &Path) -> Value {
    serde_json::from_slice(&fs::read(path).unwrap()).unwrap()
}

fn archive(projects: Value) -> Value {
    json!({
        "metadata": {
            "version": "1.1.0",
            "appVersion": "0.1.0",
            "exportedAt": "2025-01-20T10:00:00Z",
            "exportType": "full"
        },
        "data": {"projects": projects}
    })
}

fn project_ids(data_dir: &Path) -> Vec<String> {
    let projects = read_json(&data_dir.join("projects.json"));
    projects
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_version_reports_format() {
    let temp = tempdir().unwrap();

    stateport(temp.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"formatVersion\":\"1.1.0\""));
}

#[test]
fn test_export_writes_versioned_archive() {
    let temp = tempdir().unwrap();
    let data = temp.path().join("data");
    fs::create_dir_all(&data).unwrap();
    write_json(
        &data.join("projects.json"),
        &json!([{"id": "p1", "name": "Alpha", "path": "/code/alpha"}]),
    );
    let out = temp.path().join("backup.stateport");

    stateport(&data)
        .arg("export")
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"success\":true"));

    let written = read_json(&out);
    assert_eq!(written["metadata"]["version"], "1.1.0");
    assert_eq!(written["metadata"]["exportType"], "full");
    assert_eq!(written["data"]["projects"][0]["id"], "p1");
}

#[test]
fn test_export_keeps_existing_file_without_force() {
    let temp = tempdir().unwrap();
    let out = temp.path().join("backup.stateport");
    fs::write(&out, "keep me").unwrap();

    stateport(&temp.path().join("data"))
        .arg("export")
        .arg("--output")
        .arg(&out)
        .assert()
        .code(0)
        .stderr(predicate::str::contains("USER_CANCELLED"));

    assert_eq!(fs::read_to_string(&out).unwrap(), "keep me");
}

#[test]
fn test_validate_rejects_old_archive() {
    let temp = tempdir().unwrap();
    let file = temp.path().join("old.stateport");
    let mut old = archive(json!([{"id": "p1"}]));
    old["metadata"]["version"] = json!("0.9.0");
    write_json(&file, &old);

    stateport(temp.path())
        .arg("validate")
        .arg(&file)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("INVALID_FORMAT"));
}

#[test]
fn test_validate_rejects_non_json() {
    let temp = tempdir().unwrap();
    let file = temp.path().join("garbage.stateport");
    fs::write(&file, "not json").unwrap();

    stateport(temp.path())
        .arg("validate")
        .arg(&file)
        .assert()
        .code(3);
}

#[test]
fn test_preview_lists_conflicts_without_writing() {
    let temp = tempdir().unwrap();
    let data = temp.path().join("data");
    fs::create_dir_all(&data).unwrap();
    write_json(&data.join("projects.json"), &json!([{"id": "p1", "name": "Local"}]));
    let file = temp.path().join("in.stateport");
    write_json(
        &file,
        &archive(json!([{"id": "p1", "name": "Archived"}, {"id": "p2"}])),
    );

    let assert = stateport(&data)
        .arg("preview")
        .arg(&file)
        .assert()
        .success();

    let output: Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    let conflicts = output["preview"]["conflicts"].as_array().unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0]["id"], "p1");
    assert_eq!(conflicts[0]["identical"], false);
    assert_eq!(project_ids(&data), vec!["p1"]);
}

#[test]
fn test_merge_import_skips_conflicts_by_default() {
    let temp = tempdir().unwrap();
    let data = temp.path().join("data");
    fs::create_dir_all(&data).unwrap();
    write_json(&data.join("projects.json"), &json!([{"id": "p1", "name": "Local"}]));
    let file = temp.path().join("in.stateport");
    write_json(
        &file,
        &archive(json!([{"id": "p1", "name": "Archived"}, {"id": "p2"}])),
    );

    let assert = stateport(&data)
        .arg("import")
        .arg(&file)
        .assert()
        .success();

    let output: Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(output["summary"]["collections"]["project"]["imported"], 1);
    assert_eq!(output["summary"]["collections"]["project"]["skipped"], 1);

    let projects = read_json(&data.join("projects.json"));
    assert_eq!(projects[0]["name"], "Local");
    assert_eq!(project_ids(&data), vec!["p1", "p2"]);
}

#[test]
fn test_override_wins_over_default_action() {
    let temp = tempdir().unwrap();
    let data = temp.path().join("data");
    fs::create_dir_all(&data).unwrap();
    write_json(&data.join("projects.json"), &json!([{"id": "p1", "name": "Local"}]));
    let file = temp.path().join("in.stateport");
    write_json(&file, &archive(json!([{"id": "p1", "name": "Archived"}])));

    stateport(&data)
        .arg("import")
        .arg(&file)
        .arg("--override")
        .arg("project:p1=overwrite")
        .assert()
        .success();

    let projects = read_json(&data.join("projects.json"));
    assert_eq!(projects[0]["name"], "Archived");
}

#[test]
fn test_replace_import_requires_confirmation() {
    let temp = tempdir().unwrap();
    let data = temp.path().join("data");
    fs::create_dir_all(&data).unwrap();
    write_json(&data.join("projects.json"), &json!([{"id": "p1"}, {"id": "p2"}]));
    let file = temp.path().join("in.stateport");
    write_json(&file, &archive(json!([{"id": "p3"}])));

    stateport(&data)
        .arg("import")
        .arg(&file)
        .arg("--mode")
        .arg("replace")
        .assert()
        .code(5);
    assert_eq!(project_ids(&data), vec!["p1", "p2"]);

    stateport(&data)
        .arg("import")
        .arg(&file)
        .arg("--mode")
        .arg("replace")
        .arg("--yes")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"removed\":2"));
    assert_eq!(project_ids(&data), vec!["p3"]);
}

#[test]
fn test_share_workflow_round_trip() {
    let temp = tempdir().unwrap();
    let data = temp.path().join("data");
    fs::create_dir_all(&data).unwrap();
    write_json(
        &data.join("workflows.json"),
        &json!([{
            "id": "w1",
            "name": "Ship",
            "nodes": [{"id": "n1"}, {"id": "n2"}],
            "edges": [{"source": "n1", "target": "n2"}]
        }]),
    );
    let share = temp.path().join("ship.json");

    stateport(&data)
        .args(["share", "export-workflow", "w1", "--output"])
        .arg(&share)
        .assert()
        .success();

    stateport(&data)
        .args(["share", "import-workflow"])
        .arg(&share)
        .assert()
        .success();

    let workflows = read_json(&data.join("workflows.json"));
    let workflows = workflows.as_array().unwrap();
    assert_eq!(workflows.len(), 2);
    assert_ne!(workflows[1]["id"], "w1");
    assert_eq!(workflows[1]["name"], "Ship");
}

#[test]
fn test_share_unknown_workflow_is_not_found() {
    let temp = tempdir().unwrap();

    stateport(temp.path())
        .args(["share", "export-workflow", "missing", "--output"])
        .arg(temp.path().join("out.json"))
        .assert()
        .code(5)
        .stderr(predicate::str::contains("NOT_FOUND"));
}
