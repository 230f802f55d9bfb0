use crate::traits::{estimate_subword_tokens, DecodingParams, LlmClient, LlmResponse};
use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use std::time::Duration;
use textease_common::{Result, TextEaseError};

const OLLAMA_CONNECTION_ERROR: &str = "No running Ollama server detected. Start it with: `ollama serve` (after installing). Install instructions: https://github.com/ollama/ollama";

/// Ollama client for local model inference.
///
/// Expects a running Ollama server (see https://github.com/ollama/ollama).
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    /// Create a new client and verify server/model availability.
    pub async fn new(base_url: String, model: String, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().connect_timeout(Duration::from_secs(10));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TextEaseError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let ollama_client = Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        };

        ollama_client.check_server().await?;
        ollama_client.ensure_model_available().await?;

        Ok(ollama_client)
    }

    async fn check_server(&self) -> Result<()> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|_| TextEaseError::Config(OLLAMA_CONNECTION_ERROR.to_string()))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(TextEaseError::Config(OLLAMA_CONNECTION_ERROR.to_string()))
        }
    }

    async fn ensure_model_available(&self) -> Result<()> {
        let models = self.fetch_available_models().await?;

        if !models.contains(&self.model) {
            tracing::info!(model = %self.model, "model not found locally, pulling");
            self.pull_model(&self.model).await?;
        }

        Ok(())
    }

    async fn fetch_available_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TextEaseError::Config(format!("Failed to fetch models: {}", e)))?;

        if !resp.status().is_success() {
            return Ok(Vec::new());
        }

        let val: JsonValue = resp
            .json()
            .await
            .map_err(|e| TextEaseError::Config(format!("Failed to parse models response: {}", e)))?;

        let models = val
            .get("models")
            .and_then(|m| m.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.get("name").and_then(|n| n.as_str()))
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default();

        Ok(models)
    }

    async fn pull_model(&self, model: &str) -> Result<()> {
        let url = format!("{}/api/pull", self.base_url);
        let payload = json!({
            "model": model,
            "stream": false
        });

        let resp = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| TextEaseError::Config(format!("Failed to pull model: {}", e)))?;

        if resp.status().is_success() {
            tracing::info!(model, "successfully pulled model");
            Ok(())
        } else {
            Err(TextEaseError::Config(format!(
                "Failed to pull model {model}: HTTP {}",
                resp.status()
            )))
        }
    }
}

/// Ollama has no beam search or minimum length; greedy decoding with a fixed
/// seed keeps outputs reproducible.
fn decoding_options(params: &DecodingParams) -> serde_json::Map<String, JsonValue> {
    let mut options = serde_json::Map::new();
    options.insert("num_predict".to_string(), json!(params.max_tokens));
    options.insert("temperature".to_string(), json!(params.temperature));
    options.insert("seed".to_string(), json!(params.seed));
    options.insert("repeat_penalty".to_string(), json!(params.repetition_penalty));
    if params.temperature == 0.0 {
        options.insert("top_k".to_string(), json!(1));
    }
    options
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        params: &DecodingParams,
    ) -> Result<LlmResponse> {
        let url = format!("{}/api/generate", self.base_url);

        let mut payload = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": decoding_options(params),
        });
        if let Some(system) = system_prompt {
            payload["system"] = json!(system);
        }

        tracing::debug!(
            model = %self.model,
            max_tokens = params.max_tokens,
            min_tokens = params.min_tokens,
            "ollama generate"
        );

        let resp = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TextEaseError::Timeout
                } else {
                    TextEaseError::Transformation(format!("Generate request failed: {}", e))
                }
            })?;

        if !resp.status().is_success() {
            return Err(TextEaseError::Transformation(format!(
                "Generate failed: HTTP {}",
                resp.status()
            )));
        }

        let val: JsonValue = resp
            .json()
            .await
            .map_err(|e| TextEaseError::Transformation(format!("Failed to parse response: {}", e)))?;

        let text = val
            .get("response")
            .and_then(|r| r.as_str())
            .unwrap_or("")
            .to_string();

        let tokens_used = val
            .get("eval_count")
            .and_then(|c| c.as_u64())
            .map(|c| c as u32);

        Ok(LlmResponse {
            text,
            model: Some(self.model.clone()),
            tokens_used,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        self.check_server().await.map(|_| true).or(Ok(false))
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn count_tokens(&self, text: &str) -> usize {
        estimate_subword_tokens(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greedy_options_pin_top_k() {
        let options = decoding_options(&DecodingParams::beam_search(120));
        assert_eq!(options["num_predict"], json!(120));
        assert_eq!(options["top_k"], json!(1));
        assert_eq!(options["seed"], json!(crate::traits::DEFAULT_SEED));
    }
}
