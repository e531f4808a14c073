//! Integration tests for Configuration System

use super::test_utils::with_isolated_env;
use docstore::config::{global_config_path, ConfigLoader};
use docstore::container::Container;
use docstore::engine::Manager;
use docstore::query::{EvaluationType, ReturnType};

#[test]
fn test_defaults_without_any_file() {
    with_isolated_env(&[], |_| {
        let config = ConfigLoader::load().unwrap();
        assert_eq!(config.container.alias, "docstore");
        assert_eq!(config.query.evaluation, EvaluationType::Lazy);
        assert!(config.query.well_formed_only);
        assert_eq!(config.logging.level, "info");
    });
}

#[test]
fn test_explicit_file_overrides_defaults() {
    with_isolated_env(&[], |temp_dir| {
        let config_file = temp_dir.path().join("docstore.toml");
        std::fs::write(
            &config_file,
            r#"
[container]
alias = "books"
sync_every = 5

[query]
evaluation = "eager"
return_type = "dead_values"

[logging]
level = "debug"
format = "json"
"#,
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(&config_file).unwrap();
        assert_eq!(config.container.alias, "books");
        assert_eq!(config.container.sync_every, 5);
        assert_eq!(config.query.evaluation, EvaluationType::Eager);
        assert_eq!(config.query.return_type, ReturnType::DeadValues);
        assert_eq!(config.logging.format, "json");

        let dir = temp_dir.path().join("c");
        let container = Container::open_with(&Manager::new(), &dir, &config.open_options()).unwrap();
        assert_eq!(container.alias(), "books");
        assert_eq!(container.binder().compose("/x"), "collection('books')/x");
    });
}

#[test]
fn test_global_file_is_picked_up() {
    with_isolated_env(&[], |_| {
        let path = global_config_path().unwrap();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[container]\nalias = \"global\"\n").unwrap();

        let config = ConfigLoader::load().unwrap();
        assert_eq!(config.container.alias, "global");
    });
}

#[test]
fn test_environment_overrides_file() {
    with_isolated_env(
        &[
            ("DOCSTORE__CONTAINER__ALIAS", "fromenv"),
            ("DOCSTORE__CONTAINER__SYNC_EVERY", "7"),
        ],
        |temp_dir| {
            let config_file = temp_dir.path().join("docstore.toml");
            std::fs::write(&config_file, "[container]\nalias = \"fromfile\"\n").unwrap();

            let config = ConfigLoader::load_from_file(&config_file).unwrap();
            assert_eq!(config.container.alias, "fromenv");
            assert_eq!(config.container.sync_every, 7);
        },
    );
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    with_isolated_env(&[], |temp_dir| {
        let result = ConfigLoader::load_from_file(&temp_dir.path().join("absent.toml"));
        assert!(result.is_err());
    });
}

#[test]
fn test_invalid_alias_fails_validation() {
    with_isolated_env(&[], |temp_dir| {
        let config_file = temp_dir.path().join("docstore.toml");
        std::fs::write(&config_file, "[container]\nalias = \"two words\"\n").unwrap();

        let err = ConfigLoader::load_from_file(&config_file).unwrap_err();
        assert!(err.to_string().contains("container.alias"));
    });
}
