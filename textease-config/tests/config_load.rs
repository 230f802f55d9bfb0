use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;
use textease_common::ModelConfig;
use textease_common::observability::LogFormat;
use textease_config::TextEaseConfigLoader;

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
version: "0.1"
models:
  simplifier:
    provider: ollama
    model: "ruT5-simplify"
    endpoint: "${SIMPLIFIER_HOST}"
    timeout_secs: 90
  translator:
    provider: ollama
    model: "opus-mt-ru-en"
pipeline:
  source_language: ru
  target_language: en
  rewrite_budget_chars: 1800
logging:
  format: json
  emit_stderr: false
  "#;
    let p = write_yaml(&tmp, "textease.yaml", file_yaml);

    temp_env::with_var("SIMPLIFIER_HOST", Some("http://gpu-box:11434"), || {
        let config = TextEaseConfigLoader::new()
            .with_file(&p)
            .load()
            .expect("load system config");

        assert_eq!(config.version.as_deref(), Some("0.1"));
        assert_eq!(
            config.models.simplifier,
            ModelConfig::Ollama {
                model: "ruT5-simplify".into(),
                endpoint: "http://gpu-box:11434".into(),
                timeout_secs: Some(90),
            }
        );
        assert_eq!(config.pipeline.rewrite_budget_chars, 1800);
        assert_eq!(config.pipeline.translate_budget_chars, 400);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(!config.logging.emit_stderr);
    });
}

#[test]
#[serial]
fn env_overrides_file_values() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(
        &tmp,
        "textease.yaml",
        "session:\n  max_text_chars: 8000\n  mailbox: 16\n",
    );

    temp_env::with_vars(
        [
            ("TEXTEASE__SESSION__MAX_TEXT_CHARS", Some("5000")),
            ("TEXTEASE__PIPELINE__TARGET_LANGUAGE", Some("de")),
        ],
        || {
            let config = TextEaseConfigLoader::new().with_file(&p).load().unwrap();
            assert_eq!(config.session.max_text_chars, 5000);
            assert_eq!(config.session.mailbox, 16);
            assert_eq!(config.pipeline.target_language, "de");
        },
    );
}

#[test]
#[serial]
fn missing_optional_file_is_skipped() {
    let tmp = TempDir::new().unwrap();
    let config = TextEaseConfigLoader::new()
        .with_optional_file(tmp.path().join("absent.yaml"))
        .load()
        .expect("optional file may be absent");
    assert_eq!(config.session.max_text_chars, 10_000);
    assert_eq!(config.session.action_timeout_secs, Some(300));
}

#[test]
#[serial]
fn action_timeout_can_be_switched_off() {
    let config = TextEaseConfigLoader::new()
        .with_yaml_str("session:\n  action_timeout_secs: 0\n")
        .load()
        .unwrap();
    assert_eq!(config.session.action_timeout_secs, Some(0));
}

#[test]
#[serial]
fn missing_required_file_fails() {
    let tmp = TempDir::new().unwrap();
    let result = TextEaseConfigLoader::new()
        .with_file(tmp.path().join("absent.yaml"))
        .load();
    assert!(result.is_err());
}
