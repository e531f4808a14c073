//! Integration tests for merging one container into another

use docstore::container::{Container, OpenOptions};
use docstore::engine::Manager;
use docstore::StoreError;
use tempfile::TempDir;

fn source_with(dir: &TempDir, docs: &[(&str, &str)]) -> std::path::PathBuf {
    let path = dir.path().join("src");
    let mut container = Container::open(&path).unwrap();
    for (name, xml) in docs {
        container.put_xml(name, xml, false).unwrap();
    }
    container.close().unwrap();
    path
}

#[test]
fn test_merge_with_replace_takes_source_content() {
    let dir = TempDir::new().unwrap();
    let src = source_with(&dir, &[("a", "<a>src</a>"), ("b", "<b/>")]);

    let mut dst = Container::open(dir.path().join("dst")).unwrap();
    dst.put_xml("a", "<a>dst</a>", false).unwrap();

    assert_eq!(dst.merge(&src, true).unwrap(), 2);
    assert_eq!(dst.size(), 2);
    assert_eq!(dst.get("a").unwrap(), "<a>src</a>");
    assert_eq!(dst.get("b").unwrap(), "<b/>");
    assert!(!dst.error_state().is_error());
}

#[test]
fn test_merge_without_replace_stops_at_first_conflict() {
    let dir = TempDir::new().unwrap();
    let src = source_with(&dir, &[("a", "<a>src</a>"), ("b", "<b/>")]);

    let mut dst = Container::open(dir.path().join("dst")).unwrap();
    dst.put_xml("a", "<a>dst</a>", false).unwrap();

    let err = dst.merge(&src, false).unwrap_err();
    assert!(matches!(err, StoreError::DocumentExists(_)));
    assert!(dst.error_state().is_error());
    assert_eq!(dst.get("a").unwrap(), "<a>dst</a>");
    assert!(dst.get("b").is_err());
}

#[test]
fn test_merge_keeps_metadata() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("src");
    {
        let mut src = Container::open(&path).unwrap();
        let mut metadata = std::collections::BTreeMap::new();
        metadata.insert("origin".to_string(), "archive".to_string());
        src.put_xml_with_metadata("m", "<m/>", metadata, false)
            .unwrap();
    }

    let mut dst = Container::open(dir.path().join("dst")).unwrap();
    dst.merge(&path, false).unwrap();
    let doc = dst.get_document("m").unwrap();
    assert_eq!(
        doc.metadata().unwrap().get("origin").map(String::as_str),
        Some("archive")
    );
}

#[test]
fn test_merge_missing_source_fails() {
    let dir = TempDir::new().unwrap();
    let mut dst = Container::open(dir.path().join("dst")).unwrap();

    let err = dst.merge(dir.path().join("absent"), false).unwrap_err();
    assert!(matches!(err, StoreError::ContainerNotFound(_)));
    assert!(!dir.path().join("absent").exists());
}

#[test]
fn test_merge_into_itself_is_locked() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("self");
    let mut container =
        Container::open_with(&Manager::new(), &path, &OpenOptions::default()).unwrap();
    container.put_xml("a", "<a/>", false).unwrap();

    assert!(matches!(
        container.merge(&path, true),
        Err(StoreError::Locked(_))
    ));
    assert_eq!(container.size(), 1);
}
