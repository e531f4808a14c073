//! Integration tests for result cursors

use super::test_utils::BOOKS;
use docstore::container::Container;
use docstore::cursor::CursorState;
use tempfile::TempDir;

fn filled(dir: &TempDir) -> Container {
    let mut container = Container::open(dir.path().join("books")).unwrap();
    for (name, xml) in BOOKS {
        container.put_xml(name, xml, false).unwrap();
    }
    container
}

#[test]
fn test_advance_n_plus_one_times() {
    let dir = TempDir::new().unwrap();
    let container = filled(&dir);

    let mut cursor = container.get_all();
    for _ in 0..BOOKS.len() {
        assert!(cursor.advance().unwrap());
    }
    assert!(!cursor.advance().unwrap());
    assert_eq!(cursor.state(), CursorState::Exhausted);
    assert!(!cursor.advance().unwrap());
}

#[test]
fn test_name_and_content_are_stable_at_a_position() {
    let dir = TempDir::new().unwrap();
    let container = filled(&dir);

    let mut cursor = container.get_all();
    assert!(cursor.advance().unwrap());
    let first_name = cursor.name().unwrap().to_string();
    let first_content = cursor.content().unwrap().to_string();
    assert_eq!(cursor.name().unwrap(), first_name);
    assert_eq!(cursor.content().unwrap(), first_content);
    assert_eq!(first_name, "dune");
    assert_eq!(first_content, BOOKS[0].1);
}

#[test]
fn test_exhausted_cursor_reads_empty() {
    let dir = TempDir::new().unwrap();
    let container = Container::open(dir.path().join("empty")).unwrap();

    let mut cursor = container.get_all();
    assert!(!cursor.advance().unwrap());
    assert_eq!(cursor.name().unwrap(), "");
    assert_eq!(cursor.content().unwrap(), "");
    assert!(cursor.current().is_none());
}

#[test]
fn test_iterator_visits_in_name_order() {
    let dir = TempDir::new().unwrap();
    let container = filled(&dir);

    let names: Vec<String> = container
        .get_all()
        .map(|doc| doc.unwrap().name().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["dune", "neuromancer", "solaris"]);
}

#[test]
fn test_close_ends_iteration() {
    let dir = TempDir::new().unwrap();
    let container = filled(&dir);

    let mut cursor = container.get_all();
    assert!(cursor.advance().unwrap());
    cursor.close();
    assert_eq!(container.size(), 3);
}
