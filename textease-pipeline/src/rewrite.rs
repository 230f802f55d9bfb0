//! Strength-parametrized simplification of text chunks.
use crate::cleanup;
use crate::segmenter::Segmenter;
use futures::{StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use textease_common::{Result, TextEaseError};
use textease_llm::traits::{approximate_token_count, DecodingParams, LlmClient};

/// Instruction the simplifier model was trained to follow.
pub const REWRITE_PROMPT: &str = "упрости: ";

/// Longest input, in word-level tokens, the simplifier reads; longer prompts
/// are truncated.
pub const MAX_INPUT_TOKENS: usize = 512;

/// How aggressively a rewrite compresses its input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    /// Keep most detail; output may be longer than the input.
    Light,
    #[default]
    Medium,
    /// Favour brevity.
    Strong,
}

impl Strength {
    pub const ALL: [Strength; 3] = [Strength::Light, Strength::Medium, Strength::Strong];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strength::Light => "light",
            Strength::Medium => "medium",
            Strength::Strong => "strong",
        }
    }

    /// Decoding parameters for an input of `input_tokens` word-level tokens
    /// (clamped to [`MAX_INPUT_TOKENS`]).
    ///
    /// ```
    /// use textease_pipeline::rewrite::Strength;
    ///
    /// let params = Strength::Strong.decoding(40);
    /// assert_eq!((params.max_tokens, params.min_tokens), (90, 60));
    /// assert_eq!(params.length_penalty, 0.6);
    /// ```
    pub fn decoding(&self, input_tokens: usize) -> DecodingParams {
        let n = input_tokens.min(MAX_INPUT_TOKENS) as u32;
        let (max_tokens, min_tokens, length_penalty) = match self {
            Strength::Strong => ((n + 50).min(200), (n / 2).max(60), 0.6),
            Strength::Medium => ((n + 100).min(400), (n / 2).max(100), 1.0),
            Strength::Light => ((n * 2).min(512), (n / 2).max(120), 1.2),
        };
        DecodingParams::beam_search(max_tokens)
            .with_min_tokens(min_tokens)
            .with_length_penalty(length_penalty)
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strength {
    type Err = TextEaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Strength::Light),
            "medium" => Ok(Strength::Medium),
            "strong" => Ok(Strength::Strong),
            other => Err(TextEaseError::NotFound(format!(
                "unknown strength '{other}' (expected light, medium or strong)"
            ))),
        }
    }
}

/// Rewrites text through the shared simplifier model.
#[derive(Clone)]
pub struct RewriteEngine {
    model: Arc<dyn LlmClient + Send + Sync>,
    segmenter: Segmenter,
    budget_chars: usize,
    max_parallel: usize,
}

impl RewriteEngine {
    pub fn new(
        model: Arc<dyn LlmClient + Send + Sync>,
        segmenter: Segmenter,
        budget_chars: usize,
        max_parallel: usize,
    ) -> Self {
        Self {
            model,
            segmenter,
            budget_chars,
            max_parallel: max_parallel.max(1),
        }
    }

    /// Simplify one chunk. Blank input is returned unchanged.
    pub async fn rewrite(&self, text: &str, strength: Strength) -> Result<String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(text.to_string());
        }

        let prompt = format!("{REWRITE_PROMPT}{trimmed}");
        // One extra token for the end-of-sequence marker the model appends.
        let input_tokens = approximate_token_count(&prompt) + 1;
        let params = strength
            .decoding(input_tokens)
            .scaled(self.model.count_tokens(&prompt) as f32 / input_tokens as f32);

        tracing::debug!(
            model = self.model.model_name(),
            %strength,
            input_tokens,
            max_tokens = params.max_tokens,
            "rewriting chunk"
        );

        let response = self.model.generate(&prompt, None, &params).await?;
        let cleaned = cleanup::clean_rewrite(&response.text);
        if cleaned.is_empty() {
            tracing::debug!("model returned nothing usable; keeping input");
            return Ok(text.to_string());
        }
        Ok(cleaned)
    }

    /// Simplify text of any length by rewriting budget-sized chunks
    /// independently and joining them with single spaces.
    ///
    /// Text that already fits the budget is rewritten in one call, exactly as
    /// [`RewriteEngine::rewrite`] would.
    pub async fn rewrite_long(&self, text: &str, strength: Strength) -> Result<String> {
        if text.trim().chars().count() <= self.budget_chars {
            return self.rewrite(text, strength).await;
        }

        let chunks = self.segmenter.segment(text, self.budget_chars);
        tracing::debug!(chunks = chunks.len(), %strength, "rewriting long text");

        let parts: Vec<String> = futures::stream::iter(chunks)
            .map(|chunk| async move { self.rewrite(&chunk, strength).await })
            .buffered(self.max_parallel)
            .try_collect()
            .await?;

        Ok(parts.join(" "))
    }
}

impl fmt::Debug for RewriteEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RewriteEngine")
            .field("model", &self.model.model_name())
            .field("budget_chars", &self.budget_chars)
            .field("max_parallel", &self.max_parallel)
            .finish()
    }
}
