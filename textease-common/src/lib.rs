//! Common types and utilities shared across TextEase crates.
//!
//! This crate defines the model-provider configuration, the logging
//! initialiser and the shared error type used throughout the TextEase
//! workspace. It stays dependency-light so that every crate can depend on it.
//!
//! # Overview
//!
//! - [`ModelConfig`]: provider-agnostic configuration for one generative model
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`TextEaseError`] and [`Result`]: shared error handling
//!
//! # Examples
//!
//! ```rust
//! use textease_common::ModelConfig;
//!
//! let cfg = ModelConfig::default();
//! assert_eq!(cfg.model_name(), Some("llama3.2:3b"));
//! ```
use serde::{Deserialize, Serialize};

pub mod observability;

pub const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2:3b";

/// Configuration for one generative model used by the pipeline.
///
/// The `provider` tag selects the backend; see the `textease-llm` crate for
/// concrete client implementations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum ModelConfig {
    Ollama {
        model: String,
        #[serde(default = "default_ollama_endpoint")]
        endpoint: String,
        /// Per-request timeout in seconds. `None` leaves requests unbounded.
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
    None,
}

fn default_ollama_endpoint() -> String {
    DEFAULT_OLLAMA_ENDPOINT.to_string()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::Ollama {
            model: DEFAULT_OLLAMA_MODEL.to_string(),
            endpoint: default_ollama_endpoint(),
            timeout_secs: None,
        }
    }
}

impl ModelConfig {
    pub fn model_name(&self) -> Option<&str> {
        match self {
            ModelConfig::Ollama { model, .. } => Some(model),
            ModelConfig::None => None,
        }
    }
}

/// Error types used across the TextEase system.
#[derive(thiserror::Error, Debug)]
pub enum TextEaseError {
    /// The input held nothing to work on. Handled as a no-op, never a failure.
    #[error("Input is empty")]
    EmptyInput,

    /// A referenced claim or a required piece of session state is missing.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A model call (rewrite or translation) failed.
    #[error("Transformation failed: {0}")]
    Transformation(String),

    /// Submitted text exceeds the configured ceiling.
    #[error("Text is too long: {len} characters (limit {max})")]
    TooLong { len: usize, max: usize },

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation exceeded the configured timeout.
    #[error("Timeout occurred")]
    Timeout,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TextEaseError {
    /// Whether the error reflects user input rather than a system fault.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            TextEaseError::EmptyInput | TextEaseError::NotFound(_) | TextEaseError::TooLong { .. }
        )
    }
}

/// Convenient alias for results that use [`TextEaseError`].
pub type Result<T> = std::result::Result<T, TextEaseError>;
