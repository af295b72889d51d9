//! Text-in, text-out wrapper around a resolved provider.
//!
//! Every call carries a deadline; an empty answer is an error rather than an
//! empty draft.

use std::sync::Arc;
use std::time::Duration;

use super::{CompletionRequest, LlmProvider, Message, ProviderError};

/// Sampling temperature used for rewrites so repeated runs converge.
const REWRITE_TEMPERATURE: f32 = 0.0;

/// Drafting and rewriting contract over an [`LlmProvider`].
#[derive(Clone)]
pub struct ModelWriter {
    provider: Arc<dyn LlmProvider>,
    timeout: Duration,
    max_tokens: u32,
}

impl std::fmt::Debug for ModelWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelWriter")
            .field("model", &self.provider.model_id())
            .field("timeout", &self.timeout)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl ModelWriter {
    /// Wrap a provider with a per-call timeout and token cap.
    pub fn new(provider: Arc<dyn LlmProvider>, timeout: Duration, max_tokens: u32) -> Self {
        Self {
            provider,
            timeout,
            max_tokens,
        }
    }

    /// Model spec of the wrapped provider.
    pub fn model_id(&self) -> &str {
        self.provider.model_id()
    }

    /// Produce text from a system prompt and a user message.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Timeout`] when the deadline passes,
    /// [`ProviderError::EmptyResponse`] for blank output, or the provider's
    /// own error.
    pub async fn draft(&self, system: &str, user: &str) -> Result<String, ProviderError> {
        let request = CompletionRequest {
            messages: vec![Message::user(user)],
            system: Some(system.to_owned()),
            max_tokens: Some(self.max_tokens),
            temperature: None,
            json_output: false,
        };
        self.call(request).await
    }

    /// Rewrite `text` following `instructions`, deterministically.
    ///
    /// # Errors
    ///
    /// Same as [`ModelWriter::draft`].
    pub async fn rewrite(&self, instructions: &str, text: &str) -> Result<String, ProviderError> {
        let request = CompletionRequest {
            messages: vec![Message::user(text)],
            system: Some(instructions.to_owned()),
            max_tokens: Some(self.max_tokens),
            temperature: Some(REWRITE_TEMPERATURE),
            json_output: false,
        };
        self.call(request).await
    }

    /// Ask for a JSON object answer and return the raw text.
    ///
    /// # Errors
    ///
    /// Same as [`ModelWriter::draft`].
    pub async fn json(&self, system: &str, user: &str) -> Result<String, ProviderError> {
        let request = CompletionRequest {
            messages: vec![Message::user(user)],
            system: Some(system.to_owned()),
            max_tokens: Some(self.max_tokens),
            temperature: Some(REWRITE_TEMPERATURE),
            json_output: true,
        };
        self.call(request).await
    }

    async fn call(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        let response = tokio::time::timeout(self.timeout, self.provider.complete(request))
            .await
            .map_err(|_| ProviderError::Timeout(self.timeout))??;

        tracing::debug!(
            model = %response.model,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "model call completed"
        );

        let text = response.text.trim();
        if text.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(text.to_owned())
    }
}
