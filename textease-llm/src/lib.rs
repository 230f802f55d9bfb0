//! Provider-agnostic model integration for TextEase.
//!
//! This crate exposes a common [`traits::LlmClient`] interface and the Ollama
//! implementation. [`build_llm_client`] turns a
//! [`textease_common::ModelConfig`] into a shared client once at startup.
//!
//! # Examples
//! ```no_run
//! use textease_common::{ModelConfig, Result};
//! use textease_llm::build_llm_client;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let client = build_llm_client(&ModelConfig::default()).await?;
//! assert!(!client.model_name().is_empty());
//! # Ok(())
//! # }
//! ```
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod ollama;
pub mod traits;

use ollama::OllamaClient;
use std::sync::Arc;
use std::time::Duration;
use textease_common::{ModelConfig, TextEaseError};
use traits::LlmClient;

/// Connect the client described by `config`, pulling the model if needed.
pub async fn build_llm_client(
    config: &ModelConfig,
) -> textease_common::Result<Arc<dyn LlmClient + Send + Sync + 'static>> {
    match config {
        ModelConfig::Ollama {
            model,
            endpoint,
            timeout_secs,
        } => {
            let timeout = timeout_secs.map(Duration::from_secs);
            let client = OllamaClient::new(endpoint.clone(), model.clone(), timeout).await?;
            tracing::info!(model = %model, endpoint = %endpoint, "model client ready");
            Ok(Arc::new(client))
        }
        ModelConfig::None => Err(TextEaseError::Config("No model configured".to_string())),
    }
}
