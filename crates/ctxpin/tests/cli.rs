//! Integration tests for the ctxpin binary

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::{tempdir, TempDir};

/// A project with two source files and an initialized data dir
fn project() -> TempDir {
    let dir = tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("src")).unwrap();
    std::fs::write(dir.path().join("src/x.ts"), "hello").unwrap();
    std::fs::write(dir.path().join("src/y.ts"), "world").unwrap();

    ctxpin(&dir).arg("init").assert().success();
    dir
}

fn ctxpin(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ctxpin").unwrap();
    cmd.env_remove("CTXPIN_HOME")
        .env_remove("CTXPIN_LOG")
        .arg("--root")
        .arg(dir.path());
    cmd
}

fn json_data(cmd: &mut Command) -> Value {
    let output = cmd.arg("--json").output().unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let envelope: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(envelope["ok"], Value::Bool(true));
    envelope["data"].clone()
}

#[test]
fn test_init_creates_data_dir() {
    let dir = project();
    assert!(dir.path().join(".ctxpin/config.toml").exists());

    let data = json_data(ctxpin(&dir).arg("init"));
    assert_eq!(data["created"], Value::Bool(false));
}

#[test]
fn test_commands_require_init() {
    let dir = tempdir().unwrap();
    ctxpin(&dir)
        .arg("show")
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("ctxpin init"));
}

#[test]
fn test_select_and_show() {
    let dir = project();

    let data = json_data(ctxpin(&dir).args(["select", "./src/x.ts", "src", "src/nope.ts"]));
    assert_eq!(data["selected"], 1);
    assert_eq!(data["dropped"], serde_json::json!(["src", "src/nope.ts"]));

    let data = json_data(ctxpin(&dir).args(["show", "--content"]));
    assert_eq!(data["count"], 1);
    assert_eq!(data["files"][0]["path"], "src/x.ts");
    assert_eq!(data["files"][0]["content"], "hello");
}

#[test]
fn test_copy_stdout_renders_layout() {
    let dir = project();
    ctxpin(&dir).args(["select", "src/x.ts", "src/y.ts"]).assert().success();

    ctxpin(&dir)
        .args(["copy", "--stdout"])
        .assert()
        .success()
        .stdout("文件路径: src/x.ts\n内容:\nhello\n\n文件路径: src/y.ts\n内容:\nworld\n");
}

#[test]
fn test_copy_empty_context_warns() {
    let dir = project();
    let data = json_data(ctxpin(&dir).arg("copy"));
    assert_eq!(data["outcome"]["status"], "empty");
    assert_eq!(data["notifications"][0]["level"], "warning");
}

#[test]
fn test_refresh_updates_captured_content() {
    let dir = project();
    ctxpin(&dir).args(["select", "src/x.ts"]).assert().success();
    std::fs::write(dir.path().join("src/x.ts"), "hello again").unwrap();

    ctxpin(&dir).args(["refresh", "src/x.ts"]).assert().success();
    let data = json_data(ctxpin(&dir).args(["show", "--content"]));
    assert_eq!(data["files"][0]["content"], "hello again");

    ctxpin(&dir).args(["refresh", "src/y.ts"]).assert().failure().code(3);
}

#[test]
fn test_group_lifecycle() {
    let dir = project();
    ctxpin(&dir).args(["group", "save", "A", "src/x.ts"]).assert().success();
    ctxpin(&dir).args(["group", "save", "B", "src/y.ts"]).assert().success();

    let data = json_data(ctxpin(&dir).args(["group", "activate", "A"]));
    assert_eq!(data["count"], 1);
    assert_eq!(data["files"][0]["path"], "src/x.ts");

    let data = json_data(ctxpin(&dir).args(["group", "activate", "B"]));
    assert_eq!(data["count"], 2);

    let data = json_data(ctxpin(&dir).args(["group", "list"]));
    assert_eq!(data["count"], 2);
    assert_eq!(data["groups"][0]["active"], true);

    let data = json_data(ctxpin(&dir).args(["group", "delete", "A"]));
    assert_eq!(data["saved_context_files"], 1);

    let data = json_data(ctxpin(&dir).args(["group", "deactivate", "B"]));
    assert_eq!(data["count"], 0);

    ctxpin(&dir)
        .args(["group", "activate", "A"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("group list"));
}

#[test]
fn test_tree_file_overrides_scan() {
    let dir = project();
    let tree_path = dir.path().join("tree.json");
    std::fs::write(
        &tree_path,
        r#"[{"path": "virtual.ts", "type": "file", "content": "from host"}]"#,
    )
    .unwrap();

    let data = json_data(
        ctxpin(&dir)
            .arg("--tree")
            .arg(&tree_path)
            .args(["select", "virtual.ts", "src/x.ts"]),
    );
    assert_eq!(data["selected"], 1);
    assert_eq!(data["files"][0]["path"], "virtual.ts");
}

#[test]
fn test_stats_reports_counts() {
    let dir = project();
    ctxpin(&dir).args(["group", "save", "A", "src/x.ts"]).assert().success();

    let data = json_data(ctxpin(&dir).arg("stats"));
    assert_eq!(data["groups"], 1);
    assert_eq!(data["data_dir_source"], "root");
    assert_eq!(data["tree_files"], 2);
}

#[test]
fn test_copy_stdout_empty_context_warns() {
    let dir = project();
    ctxpin(&dir)
        .args(["copy", "--stdout"])
        .assert()
        .success()
        .stdout("")
        .stderr(predicate::str::contains("Nothing to copy"));

    let data = json_data(ctxpin(&dir).args(["copy", "--stdout"]));
    assert_eq!(data["outcome"]["status"], "empty");
    assert_eq!(data["notifications"][0]["level"], "warning");
}

#[test]
fn test_deactivate_unknown_group_keeps_selection() {
    let dir = project();
    ctxpin(&dir).args(["select", "src/x.ts"]).assert().success();

    ctxpin(&dir)
        .args(["group", "deactivate", "ghost"])
        .assert()
        .failure()
        .code(3);

    let data = json_data(ctxpin(&dir).arg("show"));
    assert_eq!(data["count"], 1);
}

#[test]
fn test_delete_active_group_recomputes_selection() {
    let dir = project();
    ctxpin(&dir).args(["group", "save", "A", "src/x.ts"]).assert().success();
    ctxpin(&dir).args(["group", "activate", "A"]).assert().success();

    let data = json_data(ctxpin(&dir).args(["group", "delete", "A"]));
    assert_eq!(data["saved_context_files"], 0);
    let data = json_data(ctxpin(&dir).args(["group", "list"]));
    assert_eq!(data["count"], 0);
}
