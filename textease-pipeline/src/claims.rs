use crate::sentences::SentenceSplitter;
use std::sync::Arc;

/// Sentences this short or shorter are fragments, not claims.
pub const MIN_CLAIM_CHARS: usize = 10;

/// Splits text into candidate factual claims, one per sentence.
#[derive(Clone)]
pub struct ClaimExtractor {
    splitter: Arc<dyn SentenceSplitter>,
}

impl ClaimExtractor {
    pub fn new(splitter: Arc<dyn SentenceSplitter>) -> Self {
        Self { splitter }
    }

    /// Trimmed sentences longer than [`MIN_CLAIM_CHARS`] characters, in
    /// order. An empty result means nothing was extractable.
    pub fn extract(&self, text: &str) -> Vec<String> {
        let claims: Vec<String> = self
            .splitter
            .split(text)
            .into_iter()
            .map(|sentence| sentence.trim().to_string())
            .filter(|sentence| sentence.chars().count() > MIN_CLAIM_CHARS)
            .collect();
        tracing::debug!(claims = claims.len(), "extracted claims");
        claims
    }
}
