//! Source-to-target translation with chunking for long inputs.
use crate::cleanup;
use crate::segmenter::accumulate_sentences_by_budget;
use crate::sentences::SentenceSplitter;
use futures::{StreamExt, TryStreamExt};
use std::sync::Arc;
use textease_common::Result;
use textease_llm::traits::{DecodingParams, LlmClient};

/// Output budget for one direct translation call.
pub const TRANSLATION_MAX_TOKENS: u32 = 600;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatorLimits {
    /// Texts shorter than this many characters go through a single call.
    pub direct_limit_chars: usize,
    /// Character budget for each chunk of a longer text.
    pub budget_chars: usize,
    pub max_parallel: usize,
}

impl Default for TranslatorLimits {
    fn default() -> Self {
        Self {
            direct_limit_chars: 500,
            budget_chars: 400,
            max_parallel: 2,
        }
    }
}

pub struct Translator {
    model: Arc<dyn LlmClient + Send + Sync>,
    splitter: Arc<dyn SentenceSplitter>,
    limits: TranslatorLimits,
    system_prompt: String,
}

impl Translator {
    pub fn new(
        model: Arc<dyn LlmClient + Send + Sync>,
        splitter: Arc<dyn SentenceSplitter>,
        source_language: &str,
        target_language: &str,
        limits: TranslatorLimits,
    ) -> Self {
        let system_prompt = format!(
            "Translate the user's text from {} to {}. Reply with the translation only.",
            language_name(source_language),
            language_name(target_language)
        );
        Self {
            model,
            splitter,
            limits,
            system_prompt,
        }
    }

    /// Translate `text`. Blank input yields an empty string.
    pub async fn translate(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }
        if text.chars().count() < self.limits.direct_limit_chars {
            return self.translate_direct(text).await;
        }

        let sentences = self.splitter.split(text);
        let chunks = accumulate_sentences_by_budget(sentences, self.limits.budget_chars.max(1));
        tracing::debug!(chunks = chunks.len(), "translating long text");

        let parts: Vec<String> = futures::stream::iter(chunks)
            .map(|chunk| async move { self.translate_direct(&chunk).await })
            .buffered(self.limits.max_parallel.max(1))
            .try_collect()
            .await?;

        Ok(parts.join(" "))
    }

    async fn translate_direct(&self, text: &str) -> Result<String> {
        let params = DecodingParams {
            repetition_penalty: 1.0,
            no_repeat_ngram_size: 0,
            ..DecodingParams::beam_search(TRANSLATION_MAX_TOKENS)
        };
        let response = self
            .model
            .generate(text, Some(&self.system_prompt), &params)
            .await?;
        Ok(cleanup::clean_translation(&response.text))
    }
}

fn language_name(code: &str) -> &str {
    match code {
        "ru" => "Russian",
        "en" => "English",
        "de" => "German",
        "fr" => "French",
        "es" => "Spanish",
        other => other,
    }
}
