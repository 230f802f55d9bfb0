//! In-process client for tests: deterministic, scriptable and inspectable.
use crate::traits::{approximate_token_count, DecodingParams, LlmClient, LlmResponse};
use async_trait::async_trait;
use std::sync::Mutex;
use textease_common::{Result, TextEaseError};

/// One `generate` invocation as seen by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub params: DecodingParams,
}

type Responder = dyn Fn(&RecordedCall) -> Result<String> + Send + Sync;

pub struct MockLlmClient {
    name: String,
    responder: Box<Responder>,
    token_counter: fn(&str) -> usize,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockLlmClient {
    pub fn new<F>(name: impl Into<String>, responder: F) -> Self
    where
        F: Fn(&RecordedCall) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            responder: Box::new(responder),
            token_counter: approximate_token_count,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Count tokens the way a real backend would, e.g. with
    /// [`crate::traits::estimate_subword_tokens`].
    pub fn with_token_counter(mut self, counter: fn(&str) -> usize) -> Self {
        self.token_counter = counter;
        self
    }

    /// Returns the prompt with any `instruction: ` prefix removed.
    pub fn echo(name: impl Into<String>) -> Self {
        Self::new(name, |call| {
            let body = match call.prompt.split_once(": ") {
                Some((_, rest)) => rest,
                None => call.prompt.as_str(),
            };
            Ok(body.to_string())
        })
    }

    /// Every call fails with a transformation error carrying `message`.
    pub fn failing(name: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(name, move |_| Err(TextEaseError::Transformation(message.clone())))
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        params: &DecodingParams,
    ) -> Result<LlmResponse> {
        let call = RecordedCall {
            prompt: prompt.to_string(),
            system_prompt: system_prompt.map(str::to_string),
            params: params.clone(),
        };
        let text = (self.responder)(&call)?;
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        Ok(LlmResponse {
            text,
            model: Some(self.name.clone()),
            tokens_used: None,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn model_name(&self) -> &str {
        &self.name
    }

    fn count_tokens(&self, text: &str) -> usize {
        (self.token_counter)(text)
    }
}
