//! Integration tests for the docstore binary

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn docstore(container: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_docstore"))
        .arg("--container")
        .arg(container)
        .args(args)
        .env("XDG_CONFIG_HOME", container.with_extension("config"))
        .env_remove("DOCSTORE_LOG")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim_end().to_string()
}

#[test]
fn test_put_get_size_remove() {
    let temp_dir = TempDir::new().unwrap();
    let container = temp_dir.path().join("store");

    let out = docstore(&container, &["put-xml", "doc1", "<x>1</x>"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), "Stored doc1");

    let out = docstore(&container, &["get", "doc1"]);
    assert_eq!(stdout(&out), "<x>1</x>");

    let out = docstore(&container, &["size"]);
    assert_eq!(stdout(&out), "1");

    let out = docstore(&container, &["remove", "doc1"]);
    assert!(out.status.success());
    assert_eq!(stdout(&docstore(&container, &["size"])), "0");
}

#[test]
fn test_duplicate_put_exits_nonzero() {
    let temp_dir = TempDir::new().unwrap();
    let container = temp_dir.path().join("store");

    assert!(docstore(&container, &["put-xml", "d", "<a/>"]).status.success());
    let out = docstore(&container, &["put-xml", "d", "<b/>"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("already exists"));

    assert!(docstore(&container, &["put-xml", "d", "<b/>", "--replace"])
        .status
        .success());
    assert_eq!(stdout(&docstore(&container, &["get", "d"])), "<b/>");
}

#[test]
fn test_query_and_json_listing() {
    let temp_dir = TempDir::new().unwrap();
    let container = temp_dir.path().join("store");
    docstore(&container, &["put-xml", "a", "<book><year>1965</year></book>"]);
    docstore(&container, &["put-xml", "b", "<book><year>1990</year></book>"]);

    let out = docstore(
        &container,
        &["query", "/book[year > 1980]", "--format", "names"],
    );
    assert!(out.status.success());
    assert_eq!(stdout(&out), "b");

    let out = docstore(&container, &["all", "--format", "json"]);
    let listed: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 2);
    assert_eq!(listed[0]["name"], "a");
}

#[test]
fn test_info_reports_read_write() {
    let temp_dir = TempDir::new().unwrap();
    let container = temp_dir.path().join("store");

    let out = docstore(&container, &["info", "--format", "json"]);
    let info: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(info["mode"], "read-write");
    assert_eq!(info["alias"], "docstore");
    assert_eq!(info["documents"], 0);
}
