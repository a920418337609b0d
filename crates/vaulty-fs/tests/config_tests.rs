use pretty_assertions::assert_eq;
use rstest::rstest;
use serde::{Deserialize, Serialize};
use std::fs;
use tempfile::TempDir;
use vaulty_fs::{ConfigFormat, ConfigStore, Error, NormalizedPath};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct TestConfig {
    name: String,
    count: i32,
}

#[rstest]
#[case("config.toml", "name = \"test\"\ncount = 42")]
#[case("config.json", r#"{"name": "test", "count": 42}"#)]
#[case("config.yaml", "name: test\ncount: 42")]
#[case("config.yml", "name: test\ncount: 42")]
#[case(".vaultyrc", "name: test\ncount: 42")]
fn test_load_detects_format(#[case] file_name: &str, #[case] content: &str) {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join(file_name);
    fs::write(&file_path, content).unwrap();

    let config: TestConfig = ConfigStore::new()
        .load(&NormalizedPath::new(&file_path))
        .unwrap();

    assert_eq!(
        config,
        TestConfig {
            name: "test".into(),
            count: 42
        }
    );
}

#[test]
fn test_extensionless_rc_accepts_json_content() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join(".vaultyrc");
    fs::write(&file_path, r#"{"name": "json", "count": 1}"#).unwrap();

    let config: TestConfig = ConfigStore::new()
        .load(&NormalizedPath::new(&file_path))
        .unwrap();
    assert_eq!(config.name, "json");
}

#[test]
fn test_unsupported_extension() {
    let path = NormalizedPath::new("/tmp/config.ini");
    assert!(matches!(
        ConfigFormat::detect(&path),
        Err(Error::UnsupportedFormat { .. })
    ));
}

#[test]
fn test_parse_error_names_format() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("config.json");
    fs::write(&file_path, "{ not json").unwrap();

    let err = ConfigStore::new()
        .load::<TestConfig>(&NormalizedPath::new(&file_path))
        .unwrap_err();
    assert!(err.to_string().contains("JSON"), "got: {}", err);
}

#[test]
fn test_save_yaml_roundtrip() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("store"));
    let store = ConfigStore::new();

    let value = TestConfig {
        name: "saved".into(),
        count: 7,
    };
    store.save(&path, &value, None).unwrap();

    let loaded: TestConfig = store.load(&path).unwrap();
    assert_eq!(loaded, value);
}

#[cfg(unix)]
#[test]
fn test_save_applies_mode() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("secret.yaml"));

    ConfigStore::new()
        .save(
            &path,
            &TestConfig {
                name: "m".into(),
                count: 0,
            },
            Some(0o600),
        )
        .unwrap();

    assert_eq!(vaulty_fs::file_mode(path.to_native()), Some(0o600));
}
