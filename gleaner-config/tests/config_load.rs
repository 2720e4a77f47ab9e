use gleaner_common::observability::LogFormat;
use gleaner_config::GleanerConfigLoader;
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

#[test]
#[serial]
fn test_config_load() {
    let tmp = TempDir::new().unwrap();

    let file_yaml = r#"
browser:
  webdriver_url: "http://127.0.0.1:4444"
  headless: true
  arguments: ["--start-maximized"]
  find_timeout_ms: 1500
http:
  timeout_secs: 30
  user_agent: "${GLEANER_TEST_AGENT}"
assets:
  dir: "./out/images"
  concurrency: 8
logging:
  format: json
  filter: "gleaner=debug"
  "#;
    let p = write_yaml(&tmp, "gleaner.yaml", file_yaml);

    temp_env::with_var("GLEANER_TEST_AGENT", Some("tester/2.0"), || {
        let config = GleanerConfigLoader::new()
            .with_file(&p)
            .load()
            .expect("load system config");

        assert_eq!(config.browser.webdriver_url, "http://127.0.0.1:4444");
        assert_eq!(config.browser.arguments, vec!["--start-maximized"]);
        assert_eq!(config.browser.find_timeout_ms, 1500);
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.http.retries, 2);
        assert_eq!(config.http.user_agent, "tester/2.0");
        assert_eq!(config.assets.dir, PathBuf::from("./out/images"));
        assert_eq!(config.assets.image_appendix, "png");
        assert_eq!(config.assets.concurrency, 8);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.filter, "gleaner=debug");
    });
}

#[test]
#[serial]
fn environment_overrides_file_values() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "gleaner.yaml", "browser:\n  headless: true\n");

    temp_env::with_vars(
        [
            ("GLEANER__BROWSER__HEADLESS", Some("false")),
            ("GLEANER__HTTP__RETRIES", Some("7")),
        ],
        || {
            let config = GleanerConfigLoader::new()
                .with_file(&p)
                .load()
                .expect("load with env overrides");

            assert!(!config.browser.headless);
            assert_eq!(config.http.retries, 7);
        },
    );
}

#[test]
#[serial]
fn missing_optional_file_falls_back_to_defaults() {
    let tmp = TempDir::new().unwrap();
    let config = GleanerConfigLoader::new()
        .with_optional_file(tmp.path().join("absent.yaml"))
        .load()
        .expect("optional file may be absent");

    assert!(config.browser.headless);
    assert_eq!(config.assets.dir, PathBuf::from("assets"));
}

#[test]
#[serial]
fn missing_required_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let result = GleanerConfigLoader::new()
        .with_file(tmp.path().join("absent.yaml"))
        .load();

    assert!(result.is_err());
}
