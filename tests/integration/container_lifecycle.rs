//! Integration tests for opening, writing and reading containers

use docstore::container::{Container, OpenOptions};
use docstore::engine::{AccessMode, Manager};
use docstore::StoreError;
use tempfile::TempDir;

#[test]
fn test_store1_scenario() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("store1");
    assert!(!path.exists());

    let mut container = Container::open(&path).unwrap();
    assert!(path.exists());
    assert!(!container.error_state().is_error());

    container.put_xml("doc1", "<x/>", false).unwrap();
    assert_eq!(container.get("doc1").unwrap(), "<x/>");

    let err = container.put_xml("doc1", "<y/>", false).unwrap_err();
    assert!(matches!(err, StoreError::DocumentExists(_)));
    assert!(container.error_state().is_error());

    container.put_xml("doc1", "<y/>", true).unwrap();
    assert!(!container.error_state().is_error());
    assert_eq!(container.get("doc1").unwrap(), "<y/>");
    assert_eq!(container.size(), 1);
}

#[test]
fn test_remove_then_get_fails() {
    let temp_dir = TempDir::new().unwrap();
    let mut container = Container::open(temp_dir.path().join("c")).unwrap();

    container.put_xml("a", "<a/>", false).unwrap();
    container.remove("a").unwrap();
    assert!(matches!(
        container.get("a"),
        Err(StoreError::DocumentNotFound(_))
    ));
    assert!(matches!(
        container.remove("a"),
        Err(StoreError::DocumentNotFound(_))
    ));
    assert!(container.error_state().is_error());
    assert_eq!(container.size(), 0);
}

#[test]
fn test_documents_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("c");

    let mut container = Container::open(&path).unwrap();
    container.put_xml("keep", "<keep>1</keep>", false).unwrap();
    container.close().unwrap();

    let container = Container::open(&path).unwrap();
    assert_eq!(container.access_mode(), AccessMode::ReadWrite);
    assert_eq!(container.get("keep").unwrap(), "<keep>1</keep>");
}

#[test]
fn test_put_file_names_document_by_path() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("book.xml");
    std::fs::write(&file, "<book><title>Dune</title></book>").unwrap();

    let mut container = Container::open(temp_dir.path().join("c")).unwrap();
    container.put_file(&file, false).unwrap();

    let name = file.to_string_lossy().into_owned();
    assert_eq!(
        container.get(&name).unwrap(),
        "<book><title>Dune</title></book>"
    );
}

#[test]
fn test_put_file_missing_is_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let mut container = Container::open(temp_dir.path().join("c")).unwrap();

    let err = container
        .put_file(temp_dir.path().join("missing.xml"), false)
        .unwrap_err();
    assert!(matches!(err, StoreError::Io(_)));
    assert!(container.error_state().is_error());
}

#[test]
fn test_put_file_decodes_latin1() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("cafe.xml");
    std::fs::write(
        &file,
        b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><a>caf\xe9</a>",
    )
    .unwrap();

    let mut container = Container::open(temp_dir.path().join("c")).unwrap();
    container.put_file_as("cafe", &file, false).unwrap();
    assert!(container.get("cafe").unwrap().ends_with("<a>caf\u{e9}</a>"));

    let other = temp_dir.path().join("sjis.xml");
    std::fs::write(&other, b"<?xml version='1.0' encoding='Shift_JIS'?><a/>").unwrap();
    let err = container.put_file_as("sjis", &other, false).unwrap_err();
    assert!(matches!(err, StoreError::MalformedXml { .. }));
    assert_eq!(container.size(), 1);
}

#[test]
fn test_malformed_xml_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let mut container = Container::open(temp_dir.path().join("c")).unwrap();

    let err = container.put_xml("bad", "<open>", false).unwrap_err();
    assert!(matches!(err, StoreError::MalformedXml { .. }));
    assert!(container.error_state().message().contains("bad"));
    assert_eq!(container.size(), 0);
}

#[test]
fn test_metadata_round_trips() {
    let temp_dir = TempDir::new().unwrap();
    let mut container = Container::open(temp_dir.path().join("c")).unwrap();

    let mut metadata = std::collections::BTreeMap::new();
    metadata.insert("lang".to_string(), "en".to_string());
    container
        .put_xml_with_metadata("doc", "<doc/>", metadata, false)
        .unwrap();

    let doc = container.get_document("doc").unwrap();
    assert_eq!(doc.name().unwrap(), "doc");
    assert_eq!(
        doc.metadata().unwrap().get("lang").map(String::as_str),
        Some("en")
    );
}

#[test]
fn test_second_writer_falls_back_to_read_only() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("shared");
    let manager = Manager::new();

    let mut writer = Container::open_with(&manager, &path, &OpenOptions::default()).unwrap();
    writer.put_xml("a", "<a/>", false).unwrap();

    let reader_options = OpenOptions {
        alias: "reader".to_string(),
        ..OpenOptions::default()
    };
    let mut reader = Container::open_with(&manager, &path, &reader_options).unwrap();
    assert_eq!(writer.access_mode(), AccessMode::ReadWrite);
    assert_eq!(reader.access_mode(), AccessMode::ReadOnly);

    assert_eq!(reader.get("a").unwrap(), "<a/>");
    assert!(matches!(
        reader.put_xml("b", "<b/>", false),
        Err(StoreError::ReadOnly)
    ));
    assert!(matches!(reader.remove("a"), Err(StoreError::ReadOnly)));
    assert!(reader.error_state().is_error());
    assert_eq!(writer.size(), 1);
}

#[test]
fn test_second_open_of_same_path_is_read_only() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("twice");

    let mut first = Container::open(&path).unwrap();
    first.put_xml("a", "<a>1</a>", false).unwrap();

    let mut second = Container::open(&path).unwrap();
    assert_eq!(first.access_mode(), AccessMode::ReadWrite);
    assert_eq!(second.access_mode(), AccessMode::ReadOnly);
    assert_eq!(second.get("a").unwrap(), "<a>1</a>");
    assert!(matches!(
        second.put_xml("b", "<b/>", false),
        Err(StoreError::ReadOnly)
    ));

    first.put_xml("c", "<c/>", false).unwrap();
    assert_eq!(second.size(), 2);
}

#[test]
fn test_unquotable_alias_fails_open() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("c");
    let manager = Manager::new();

    for alias in ["it's", "", "two words"] {
        let options = OpenOptions {
            alias: alias.to_string(),
            ..OpenOptions::default()
        };
        let err = Container::open_with(&manager, &path, &options).err();
        assert!(matches!(err, Some(StoreError::InvalidName(_))), "{:?}", alias);
    }
    assert!(!path.exists());
}

#[test]
fn test_duplicate_alias_fails_open() {
    let temp_dir = TempDir::new().unwrap();
    let manager = Manager::new();

    let _first =
        Container::open_with(&manager, temp_dir.path().join("one"), &OpenOptions::default())
            .unwrap();
    let second = Container::open_with(
        &manager,
        temp_dir.path().join("two"),
        &OpenOptions::default(),
    );
    assert!(matches!(second, Err(StoreError::AliasTaken(_))));
}

#[test]
fn test_alias_is_free_again_after_drop() {
    let temp_dir = TempDir::new().unwrap();
    let manager = Manager::new();

    let first =
        Container::open_with(&manager, temp_dir.path().join("one"), &OpenOptions::default())
            .unwrap();
    drop(first);
    let second =
        Container::open_with(&manager, temp_dir.path().join("two"), &OpenOptions::default())
            .unwrap();
    assert_eq!(second.access_mode(), AccessMode::ReadWrite);
}
