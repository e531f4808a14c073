//! Property-based tests for put/get/remove behavior

use docstore::container::Container;
use proptest::prelude::*;
use std::collections::BTreeMap;
use tempfile::TempDir;

fn xml_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,;:!?-]{0,40}"
}

fn doc_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_./-]{0,15}"
}

#[derive(Debug, Clone)]
enum Op {
    Put(String, String, bool),
    Remove(String),
}

fn op() -> impl Strategy<Value = Op> {
    let names = prop::sample::select(vec!["a", "b", "c", "d"]);
    prop_oneof![
        (names.clone(), xml_text(), any::<bool>())
            .prop_map(|(n, t, r)| Op::Put(n.to_string(), t, r)),
        names.prop_map(|n| Op::Remove(n.to_string())),
    ]
}

/// Put then get returns the inserted content byte-for-byte
#[test]
fn test_put_get_round_trip_property() {
    let mut runner = proptest::test_runner::TestRunner::new(ProptestConfig::with_cases(32));

    runner
        .run(&(doc_name(), xml_text()), |(name, text)| {
            let dir = TempDir::new().unwrap();
            let mut container = Container::open(dir.path().join("c")).unwrap();
            let content = format!("<doc note=\"{}\">{}</doc>", text, text);

            container.put_xml(&name, &content, false).unwrap();
            prop_assert_eq!(container.get(&name).unwrap(), content);
            Ok(())
        })
        .unwrap();
}

/// Size equals the number of names whose get succeeds
#[test]
fn test_size_matches_gettable_names_property() {
    let mut runner = proptest::test_runner::TestRunner::new(ProptestConfig::with_cases(24));

    runner
        .run(&prop::collection::vec(op(), 0..20), |ops| {
            let dir = TempDir::new().unwrap();
            let mut container = Container::open(dir.path().join("c")).unwrap();
            let mut model: BTreeMap<String, String> = BTreeMap::new();

            for op in ops {
                match op {
                    Op::Put(name, text, replace) => {
                        let content = format!("<v>{}</v>", text);
                        let result = container.put_xml(&name, &content, replace);
                        if replace || !model.contains_key(&name) {
                            prop_assert!(result.is_ok());
                            model.insert(name, content);
                        } else {
                            prop_assert!(result.is_err());
                        }
                    }
                    Op::Remove(name) => {
                        let result = container.remove(&name);
                        prop_assert_eq!(result.is_ok(), model.remove(&name).is_some());
                    }
                }
            }

            let gettable = ["a", "b", "c", "d"]
                .iter()
                .filter(|name| container.get(name).is_ok())
                .count() as u64;
            prop_assert_eq!(container.size(), gettable);
            prop_assert_eq!(container.size(), model.len() as u64);
            for (name, content) in &model {
                prop_assert_eq!(&container.get(name).unwrap(), content);
            }
            Ok(())
        })
        .unwrap();
}
