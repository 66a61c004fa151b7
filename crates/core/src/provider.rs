//! Provider abstraction over chat-completion back-ends.
//!
//! The reasoning loop drives a text protocol (Thought/Action/Observation),
//! so the provider surface is deliberately narrow: render a prompt, get
//! text back. Native tool-calling APIs are out of scope.

use crate::error::ProviderError;
use async_trait::async_trait;

/// A single completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System prompt establishing the agent identity and format rules.
    pub system: String,

    /// User content: the task plus the transcript so far.
    pub prompt: String,

    /// Sampling temperature override; falls back to provider config.
    pub temperature: Option<f32>,

    /// Completion token cap override; falls back to provider config.
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            temperature: None,
            max_tokens: None,
        }
    }
}

/// A completion response.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Raw assistant text, unparsed.
    pub text: String,

    /// Model identifier reported by the back-end, when present.
    pub model: Option<String>,
}

/// A chat-completion back-end.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Short name for logs and diagnostics (e.g. "openai-compat").
    fn name(&self) -> &str;

    /// Execute one completion round-trip.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, ProviderError>;
}
