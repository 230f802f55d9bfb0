//! Loader for TextEase configuration with YAML + environment overlays.
//!
//! Sources are merged in order: optional YAML files or inline snippets, then
//! `TEXTEASE__`-prefixed environment variables (`__` separates nesting, so
//! `TEXTEASE__SESSION__MAX_TEXT_CHARS=5000` overrides `session.max_text_chars`).
//! String values may reference `${VAR}` placeholders; they are expanded after
//! merging, recursively up to a fixed depth. Every section has defaults, so an
//! empty document is a valid configuration.
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use textease_common::ModelConfig;
use textease_common::observability::LogFormat;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "TEXTEASE";
const DEFAULT_FILE_NAME: &str = "textease.yaml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TextEaseConfig {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The two process-wide models: one rewrites, one translates.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ModelsConfig {
    #[serde(default)]
    pub simplifier: ModelConfig,
    #[serde(default)]
    pub translator: ModelConfig,
}

/// Budgets and languages for the rewrite/translate pipeline.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Language of incoming text; selects the sentence splitter rules.
    pub source_language: String,
    /// Language the translator produces.
    pub target_language: String,
    /// Character budget per rewrite chunk.
    pub rewrite_budget_chars: usize,
    /// Texts shorter than this are translated in a single call.
    pub translate_direct_limit_chars: usize,
    /// Character budget per translation chunk for longer texts.
    pub translate_budget_chars: usize,
    /// Upper bound on chunks sent to a model at the same time.
    pub max_parallel_chunks: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_language: "ru".to_string(),
            target_language: "en".to_string(),
            rewrite_budget_chars: 2000,
            translate_direct_limit_chars: 500,
            translate_budget_chars: 400,
            max_parallel_chunks: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Longest text a session accepts from `submit_text`/`submit_document`.
    pub max_text_chars: usize,
    /// Abort a single action after this many seconds. `null` or `0` disables it.
    pub action_timeout_secs: Option<u64>,
    /// Mailbox capacity of each per-user session actor.
    pub mailbox: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_text_chars: 10_000,
            action_timeout_secs: Some(300),
            mailbox: 32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub emit_stderr: bool,
    pub filter: String,
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            emit_stderr: true,
            filter: "info".to_string(),
            dir: None,
        }
    }
}

/// Default location of the configuration file (`<config dir>/textease/textease.yaml`).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("textease").join(DEFAULT_FILE_NAME))
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct TextEaseConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    files: Vec<(PathBuf, bool)>,
    snippets: Vec<String>,
}

impl Default for TextEaseConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl TextEaseConfigLoader {
    /// Start empty: defaults + `TEXTEASE__` env overrides.
    ///
    /// ```
    /// use textease_config::TextEaseConfigLoader;
    ///
    /// let config = TextEaseConfigLoader::new()
    ///     .with_yaml_str("version: '1'")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.pipeline.rewrite_budget_chars, 2000);
    /// assert_eq!(config.session.max_text_chars, 10_000);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            files: Vec::new(),
            snippets: Vec::new(),
        }
    }

    /// Attach a YAML/TOML/JSON file that must exist; the format is inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.files.push((path.as_ref().to_path_buf(), true));
        self
    }

    /// Attach a file that is silently skipped when missing, so environment-only
    /// deployments need no file at all.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.files.push((path.as_ref().to_path_buf(), false));
        self
    }

    /// Merge an inline YAML snippet (tests and CLI overrides).
    ///
    /// ```
    /// use textease_common::ModelConfig;
    /// use textease_config::TextEaseConfigLoader;
    ///
    /// let cfg = TextEaseConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// models:
    ///   simplifier:
    ///     provider: ollama
    ///     model: "ruT5-simplify"
    ///   translator:
    ///     provider: none
    /// pipeline:
    ///   max_parallel_chunks: 4
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.models.simplifier.model_name(), Some("ruT5-simplify"));
    /// assert_eq!(cfg.models.translator, ModelConfig::None);
    /// assert_eq!(cfg.pipeline.max_parallel_chunks, 4);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.snippets.push(yaml.to_string());
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// ```
    /// use textease_common::ModelConfig;
    /// use textease_config::TextEaseConfigLoader;
    ///
    /// unsafe { std::env::set_var("TEXTEASE_DOC_MODEL", "mt-ru-en"); }
    ///
    /// let config = TextEaseConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// models:
    ///   translator:
    ///     provider: ollama
    ///     model: "${TEXTEASE_DOC_MODEL}"
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// match &config.models.translator {
    ///     ModelConfig::Ollama { model, endpoint, .. } => {
    ///         assert_eq!(model, "mt-ru-en");
    ///         assert_eq!(endpoint, "http://localhost:11434");
    ///     }
    ///     other => panic!("expected Ollama configuration, got {other:?}"),
    /// }
    ///
    /// unsafe { std::env::remove_var("TEXTEASE_DOC_MODEL"); }
    /// ```
    pub fn load(self) -> Result<TextEaseConfig, ConfigError> {
        let mut builder = self.builder;
        for (path, required) in &self.files {
            builder = builder.add_source(File::from(path.as_path()).required(*required));
        }
        for yaml in &self.snippets {
            builder = builder.add_source(File::from_str(yaml, config::FileFormat::Yaml));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;

        // Go through serde_json so placeholders can be expanded before typing.
        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: TextEaseConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed.validate()?;

        Ok(typed)
    }
}

impl TextEaseConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.pipeline;
        if p.rewrite_budget_chars == 0 || p.translate_budget_chars == 0 {
            return Err(ConfigError::Message(
                "pipeline chunk budgets must be at least 1 character".into(),
            ));
        }
        if p.translate_budget_chars > p.translate_direct_limit_chars {
            return Err(ConfigError::Message(format!(
                "translate_budget_chars ({}) must not exceed translate_direct_limit_chars ({})",
                p.translate_budget_chars, p.translate_direct_limit_chars
            )));
        }
        if self.session.max_text_chars == 0 || self.session.mailbox == 0 {
            return Err(ConfigError::Message(
                "session.max_text_chars and session.mailbox must be positive".into(),
            ));
        }
        Ok(())
    }
}
