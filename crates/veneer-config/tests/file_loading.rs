//! Loading configuration files from disk.

use std::io::Write;

use veneer_config::{ConfigError, ConfigLoader};

fn write_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_toml_file() {
    let file = write_file(
        ".toml",
        r#"
            [web.result]
            packages = ["user_service::controller"]

            [messages]
            USER_1001 = "user already exists"
        "#,
    );

    let loader = ConfigLoader::new().with_file(file.path()).unwrap();
    assert!(loader.file_loaded());
    let config = loader.load().unwrap();
    assert_eq!(config.messages["USER_1001"], "user already exists");
}

#[test]
fn test_json_file() {
    let file = write_file(".json", r#"{"web": {"result": {"enabled": false}}}"#);
    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
    assert!(!config.web.result.enabled);
}

#[test]
fn test_unknown_extension() {
    let file = write_file(".yaml", "server: {}");
    let err = ConfigLoader::new().with_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
}

#[test]
fn test_malformed_file() {
    let file = write_file(".toml", "[web.result\npackages = 1");
    let err = ConfigLoader::new().with_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)));
}

#[test]
fn test_file_then_env_prefix_without_matches() {
    let file = write_file(
        ".toml",
        r#"
            [web.result]
            packages = ["app"]
        "#,
    );
    let config = ConfigLoader::new()
        .with_file(file.path())
        .unwrap()
        .with_env_prefix("VENEER_FILE_LOADING_TEST_UNSET")
        .load()
        .unwrap();
    assert_eq!(config.web.result.packages, vec!["app"]);
}
