//! Integration tests for Atomgraph
//!
//! These tests drive the `atomgraph` binary against stores on disk and
//! check the library crates work together end to end.

use atomgraph_core::IntegrityChecker;
use atomgraph_merge::{ConflictResolver, MergeStrategy};
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn write_store(files: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    for (path, content) in files {
        let full_path = temp_dir.path().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full_path, content).unwrap();
    }
    temp_dir
}

fn atomgraph(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_atomgraph"))
        .args(args)
        .current_dir(dir)
        .env("ATOMGRAPH_LOG", "off")
        .output()
        .expect("Failed to execute atomgraph")
}

fn consistent_store() -> TempDir {
    write_store(&[
        ("atoms/req.yaml", "id: REQ-1\ntype: requirement\ndownstream_ids: [DES-1]\n"),
        ("atoms/des.yaml", "id: DES-1\ntype: design\nupstream_ids: [REQ-1]\n"),
        ("modules/core.yaml", "module_id: core\nname: Core\natom_ids: [REQ-1, DES-1]\n"),
    ])
}

fn broken_store() -> TempDir {
    write_store(&[
        ("atoms/a.yaml", "id: a\ndownstream_ids: [b, ghost]\n"),
        ("atoms/b.yaml", "id: b\ndownstream_ids: [a]\nupstream_ids: [a]\n"),
        ("atoms/lonely.yaml", "id: lonely\n"),
    ])
}

#[test]
fn test_cli_invocation() {
    let temp_dir = TempDir::new().unwrap();
    let output = atomgraph(temp_dir.path(), &["--help"]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("Integrity checks and conflict resolution"));
}

#[test]
fn test_check_passes_on_consistent_store() {
    let temp_dir = consistent_store();
    let output = atomgraph(temp_dir.path(), &["check"]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Atoms:   2"), "{stdout}");
}

#[test]
fn test_check_fails_on_errors() {
    let temp_dir = broken_store();
    let output = atomgraph(temp_dir.path(), &["check"]);

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Broken reference: atom 'a' lists missing downstream atom 'ghost'"));
    assert!(stdout.contains("Circular dependency"));
    assert!(stdout.contains("Orphaned atom: 'lonely'"));
}

#[test]
fn test_check_report_only_succeeds() {
    let temp_dir = broken_store();
    let output = atomgraph(temp_dir.path(), &["check", "--report-only"]);

    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("ghost"));
}

#[test]
fn test_check_json_report() {
    let temp_dir = broken_store();
    let output = atomgraph(temp_dir.path(), &["check", "--json", "--report-only"]);

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["total_atoms"], 3);
    assert_eq!(report["broken_references"], 1);
    assert_eq!(report["orphans"], serde_json::json!(["lonely"]));
}

#[test]
fn test_check_without_atoms_dir_fails() {
    let temp_dir = write_store(&[("README.md", "empty\n")]);
    let output = atomgraph(temp_dir.path(), &["check", "--report-only"]);

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_check_with_root_flag() {
    let temp_dir = consistent_store();
    let elsewhere = TempDir::new().unwrap();
    let root = temp_dir.path().to_string_lossy().to_string();
    let output = atomgraph(elsewhere.path(), &["check", "--root", &root]);

    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn test_merge_command_three_way() {
    let temp_dir = write_store(&[
        ("base.yaml", "id: a\ntitle: Title\ntags: [x]\n"),
        ("local.yaml", "id: a\ntitle: Title v2\ntags: [x, y]\n"),
        ("remote.yaml", "id: a\ntitle: Title\ntags: [x, z]\n"),
    ]);
    let output = atomgraph(
        temp_dir.path(),
        &["merge", "--base", "base.yaml", "--local", "local.yaml", "--remote", "remote.yaml"],
    );

    assert_eq!(output.status.code(), Some(0));
    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["success"], true);
    assert_eq!(result["strategy"], "three_way");
    assert_eq!(result["merged_data"]["title"], "Title v2");
    assert_eq!(result["merged_data"]["tags"], serde_json::json!(["x", "y", "z"]));
}

#[test]
fn test_merge_command_conflict_exits_nonzero() {
    let temp_dir = write_store(&[
        ("base.yaml", "meta: {k: 1}\n"),
        ("local.yaml", "meta: {k: 2}\n"),
        ("remote.yaml", "meta: {k: 3}\n"),
    ]);
    let output = atomgraph(
        temp_dir.path(),
        &["merge", "--base", "base.yaml", "--local", "local.yaml", "--remote", "remote.yaml"],
    );

    assert_eq!(output.status.code(), Some(1));
    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["conflict_type"], "field_conflict");
    assert_eq!(result["conflicts"][0]["resolution"], "manual_required");
}

#[test]
fn test_merge_command_strategy_from_config() {
    let temp_dir = write_store(&[
        ("atomgraph.toml", "default_strategy = \"last_write_wins\"\n"),
        ("base.yaml", "x: 1\n"),
        ("local.yaml", "x: 2\n"),
        ("remote.yaml", "x: 3\n"),
    ]);
    let output = atomgraph(
        temp_dir.path(),
        &[
            "merge",
            "--base",
            "base.yaml",
            "--local",
            "local.yaml",
            "--remote",
            "remote.yaml",
            "--local-timestamp",
            "2024-06-02T00:00:00Z",
            "--remote-timestamp",
            "2024-06-01T00:00:00Z",
        ],
    );

    assert_eq!(output.status.code(), Some(0));
    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["strategy"], "last_write_wins");
    assert_eq!(result["merged_data"]["x"], 2);
}

#[test]
fn test_merge_command_unknown_strategy() {
    let temp_dir = write_store(&[("base.yaml", "x: 1\n")]);
    let output = atomgraph(
        temp_dir.path(),
        &[
            "merge",
            "--base",
            "base.yaml",
            "--local",
            "base.yaml",
            "--remote",
            "base.yaml",
            "--strategy",
            "newest",
        ],
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown merge strategy 'newest'"));
}

#[test]
fn test_impact_command() {
    let temp_dir = write_store(&[
        ("atoms/a.yaml", "id: a\ndownstream_ids: [b]\n"),
        ("atoms/b.yaml", "id: b\nupstream_ids: [a]\ndownstream_ids: [c]\n"),
        ("atoms/c.yaml", "id: c\nupstream_ids: [b]\n"),
    ]);

    let output = atomgraph(temp_dir.path(), &["impact", "b"]);
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Upstream of b (1):\n  a"));
    assert!(stdout.contains("Downstream of b (1):\n  c"));

    let output = atomgraph(temp_dir.path(), &["impact", "nope"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_loader_to_checker() {
    let temp_dir = broken_store();
    let store = atomgraph_loader::load_store(temp_dir.path()).unwrap();
    let (graph, warnings) = store.into_graph();
    assert!(warnings.is_empty());

    let first = IntegrityChecker::new(&graph).check();
    let second = IntegrityChecker::new(&graph).check();
    assert_eq!(first, second);
    assert_eq!(first.cycles, vec![vec!["a".to_string(), "b".to_string(), "a".to_string()]]);
}

#[test]
fn test_yaml_records_merge() {
    let base: serde_json::Value = serde_yaml::from_str("id: a\ncontent: Intro.\n").unwrap();
    let local: serde_json::Value =
        serde_yaml::from_str("id: a\ncontent: Intro. Local.\n").unwrap();
    let remote: serde_json::Value =
        serde_yaml::from_str("id: a\ncontent: Intro. Remote.\n").unwrap();

    let result = ConflictResolver::new().merge_documents(
        &base,
        &local,
        &remote,
        MergeStrategy::ThreeWay,
        None,
    );
    assert!(result.success);
    assert_eq!(result.merged_data["content"], "Intro. Local. Remote.");
}
