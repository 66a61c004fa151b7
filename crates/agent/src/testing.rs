//! Test support: scripted providers for driving the loop without a model.

use agentloom_core::{CompletionRequest, CompletionResponse, Provider, ProviderError};
use async_trait::async_trait;
use std::sync::Mutex;

/// Returns a fixed sequence of replies, one per `complete` call, and
/// records every prompt it was given. Repeats the last reply once the
/// script runs out.
pub struct SequentialMockProvider {
    replies: Vec<String>,
    state: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    next: usize,
    prompts: Vec<String>,
}

impl SequentialMockProvider {
    pub fn new(replies: Vec<String>) -> Self {
        Self {
            replies,
            state: Mutex::new(MockState::default()),
        }
    }

    /// The user prompts seen so far, in call order.
    pub fn seen_prompts(&self) -> Vec<String> {
        self.state.lock().unwrap().prompts.clone()
    }

    /// Number of `complete` calls made.
    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().next
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.prompts.push(request.prompt);
        let index = state.next.min(self.replies.len().saturating_sub(1));
        state.next += 1;
        let text = self
            .replies
            .get(index)
            .cloned()
            .ok_or_else(|| ProviderError::NotConfigured("mock has no replies".into()))?;
        Ok(CompletionResponse {
            text,
            model: Some("mock-model".into()),
        })
    }
}

/// Always fails with a network error.
pub struct FailingProvider;

#[async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing-mock"
    }

    async fn complete(
        &self,
        _request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        Err(ProviderError::Network("connection refused".into()))
    }
}
