use crate::claims::ClaimExtractor;
use crate::quality::{self, QualityReport};
use crate::rewrite::{RewriteEngine, Strength};
use crate::segmenter::Segmenter;
use crate::sentences::sentence_splitter_for;
use crate::translate::{Translator, TranslatorLimits};
use std::sync::Arc;
use textease_common::Result;
use textease_config::{PipelineConfig, TextEaseConfig};
use textease_llm::build_llm_client;
use textease_llm::traits::LlmClient;

/// Process-wide pipeline components, built once at startup and shared
/// read-only by every session.
#[derive(Clone)]
pub struct AssistantContext {
    inner: Arc<Inner>,
}

struct Inner {
    segmenter: Segmenter,
    rewriter: RewriteEngine,
    translator: Translator,
    claims: ClaimExtractor,
}

impl AssistantContext {
    /// Connect both models described in `config` and assemble the pipeline.
    pub async fn from_config(config: &TextEaseConfig) -> Result<Self> {
        let simplifier = build_llm_client(&config.models.simplifier).await?;
        let translator = build_llm_client(&config.models.translator).await?;
        Ok(Self::with_models(simplifier, translator, &config.pipeline))
    }

    /// Assemble the pipeline around already-connected models.
    pub fn with_models(
        simplifier: Arc<dyn LlmClient + Send + Sync>,
        translator: Arc<dyn LlmClient + Send + Sync>,
        pipeline: &PipelineConfig,
    ) -> Self {
        let splitter = sentence_splitter_for(&pipeline.source_language);
        let segmenter = Segmenter::new(splitter.clone());
        let rewriter = RewriteEngine::new(
            simplifier,
            segmenter.clone(),
            pipeline.rewrite_budget_chars,
            pipeline.max_parallel_chunks,
        );
        let translator = Translator::new(
            translator,
            splitter.clone(),
            &pipeline.source_language,
            &pipeline.target_language,
            TranslatorLimits {
                direct_limit_chars: pipeline.translate_direct_limit_chars,
                budget_chars: pipeline.translate_budget_chars,
                max_parallel: pipeline.max_parallel_chunks,
            },
        );
        tracing::info!(
            splitter = splitter.name(),
            source = %pipeline.source_language,
            target = %pipeline.target_language,
            "pipeline assembled"
        );
        Self {
            inner: Arc::new(Inner {
                segmenter,
                rewriter,
                translator,
                claims: ClaimExtractor::new(splitter),
            }),
        }
    }

    pub fn segment(&self, text: &str, max_chars: usize) -> Vec<String> {
        self.inner.segmenter.segment(text, max_chars)
    }

    pub async fn rewrite(&self, text: &str, strength: Strength) -> Result<String> {
        self.inner.rewriter.rewrite(text, strength).await
    }

    pub async fn rewrite_long(&self, text: &str, strength: Strength) -> Result<String> {
        self.inner.rewriter.rewrite_long(text, strength).await
    }

    pub async fn translate(&self, text: &str) -> Result<String> {
        self.inner.translator.translate(text).await
    }

    pub fn extract_claims(&self, text: &str) -> Vec<String> {
        self.inner.claims.extract(text)
    }

    pub fn evaluate(&self, original: &str, rewritten: &str) -> QualityReport {
        quality::evaluate(original, rewritten)
    }
}

impl std::fmt::Debug for AssistantContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantContext")
            .field("segmenter", &self.inner.segmenter)
            .field("rewriter", &self.inner.rewriter)
            .finish_non_exhaustive()
    }
}
