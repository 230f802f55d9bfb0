use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use textease_common::Result;

static PRE_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+|[^\w\s]").expect("static token pattern"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub model: Option<String>,
    pub tokens_used: Option<u32>,
}

/// Decoding knobs for one generation call.
///
/// The defaults describe deterministic beam search: no sampling, a fixed
/// seed, and suppression of repeated trigrams. Backends map what they
/// support and ignore the rest.
///
/// ```
/// use textease_llm::traits::DecodingParams;
///
/// let params = DecodingParams::beam_search(200)
///     .with_min_tokens(60)
///     .with_length_penalty(0.6);
/// assert_eq!(params.num_beams, 4);
/// assert_eq!(params.no_repeat_ngram_size, 3);
/// assert_eq!(params.temperature, 0.0);
/// assert_eq!(params.min_tokens, 60);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodingParams {
    pub max_tokens: u32,
    pub min_tokens: u32,
    pub num_beams: u32,
    /// Values below 1.0 favour shorter outputs, above 1.0 longer ones.
    pub length_penalty: f32,
    pub repetition_penalty: f32,
    pub no_repeat_ngram_size: u32,
    pub early_stopping: bool,
    pub temperature: f32,
    pub seed: u64,
}

pub const DEFAULT_SEED: u64 = 42;

impl DecodingParams {
    pub fn beam_search(max_tokens: u32) -> Self {
        Self {
            max_tokens,
            min_tokens: 0,
            num_beams: 4,
            length_penalty: 1.0,
            repetition_penalty: 1.1,
            no_repeat_ngram_size: 3,
            early_stopping: true,
            temperature: 0.0,
            seed: DEFAULT_SEED,
        }
    }

    /// Minimum output length, clamped so it never exceeds `max_tokens`.
    pub fn with_min_tokens(mut self, min_tokens: u32) -> Self {
        self.min_tokens = min_tokens.min(self.max_tokens);
        self
    }

    pub fn with_length_penalty(mut self, length_penalty: f32) -> Self {
        self.length_penalty = length_penalty;
        self
    }

    /// Stretch both length bounds by `factor` (ignored below 1.0), for
    /// budgets computed in coarser units than the backend's tokens.
    pub fn scaled(mut self, factor: f32) -> Self {
        if factor > 1.0 {
            self.max_tokens = (self.max_tokens as f32 * factor).ceil() as u32;
            self.min_tokens = (self.min_tokens as f32 * factor).ceil() as u32;
        }
        self
    }
}

impl Default for DecodingParams {
    fn default() -> Self {
        Self::beam_search(256)
    }
}

/// Word-level count: one token per word run and per punctuation mark.
/// Decoding budgets are expressed in these units.
pub fn approximate_token_count(text: &str) -> usize {
    PRE_TOKEN_RE.find_iter(text).count()
}

/// Byte-pair tokens a llama-family vocabulary spends on `text`, estimated per
/// word: about four ASCII characters per token and two and a half characters
/// per token for other scripts such as Cyrillic.
pub fn estimate_subword_tokens(text: &str) -> usize {
    PRE_TOKEN_RE
        .find_iter(text)
        .map(|word| {
            let ascii = word.as_str().chars().filter(char::is_ascii).count();
            let other = word.as_str().chars().count() - ascii;
            (ascii.div_ceil(4) + (other * 2).div_ceil(5)).max(1)
        })
        .sum()
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a completion for `prompt` with an optional system prompt.
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        params: &DecodingParams,
    ) -> Result<LlmResponse>;

    /// Check if the model service is available
    async fn health_check(&self) -> Result<bool>;

    /// Get the model name being used
    fn model_name(&self) -> &str;

    /// Number of tokens `text` occupies for this model. Defaults to the
    /// word-level count; backends with sub-word vocabularies override it.
    fn count_tokens(&self, text: &str) -> usize {
        approximate_token_count(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_tokens_never_exceed_max() {
        let params = DecodingParams::beam_search(50).with_min_tokens(60);
        assert_eq!(params.min_tokens, 50);
    }

    #[test]
    fn counts_words_and_punctuation() {
        assert_eq!(approximate_token_count(""), 0);
        assert_eq!(approximate_token_count("Главный герой пошёл в лес."), 6);
        assert_eq!(approximate_token_count("a, b!"), 4);
    }

    #[test]
    fn cyrillic_costs_more_subword_tokens_than_words() {
        // Главный 3, герой 2, пошёл 2, в 1, лес 2, "." 1
        assert_eq!(estimate_subword_tokens("Главный герой пошёл в лес."), 11);
        assert_eq!(estimate_subword_tokens("Hello world."), 5);
        assert_eq!(estimate_subword_tokens(""), 0);
    }

    #[test]
    fn scaling_stretches_both_bounds_but_never_shrinks() {
        let params = DecodingParams::beam_search(200).with_min_tokens(60).scaled(2.5);
        assert_eq!((params.max_tokens, params.min_tokens), (500, 150));
        let same = DecodingParams::beam_search(200).scaled(0.5);
        assert_eq!(same.max_tokens, 200);
    }
}
