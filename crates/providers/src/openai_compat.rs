//! OpenAI-compatible provider implementation.
//!
//! Works with LM Studio (the default local back-end), Ollama, vLLM, and any
//! hosted endpoint exposing `/v1/chat/completions`. Non-streaming only: the
//! reasoning loop needs the complete reply before it can parse an action.

use agentloom_core::{CompletionRequest, CompletionResponse, Provider, ProviderError};
use agentloom_config::LlmConfig;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// An OpenAI-compatible LLM provider.
pub struct OpenAiCompatProvider {
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    max_tokens: u32,
    timeout_secs: u64,
    max_retries: u32,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a provider from loaded configuration.
    pub fn from_config(config: &LlmConfig) -> Result<Self, ProviderError> {
        Self::new(
            &config.base_url,
            &config.model,
            None,
            config.temperature,
            config.max_tokens,
            config.timeout_secs,
            config.max_retries,
        )
    }

    pub fn new(
        base_url: &str,
        model: &str,
        api_key: Option<String>,
        temperature: f32,
        max_tokens: u32,
        timeout_secs: u64,
        max_retries: u32,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
            temperature,
            max_tokens,
            timeout_secs,
            max_retries,
            client,
        })
    }

    /// The configured model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Check whether the back-end is reachable (used by `doctor`).
    pub async fn health_check(&self) -> Result<bool, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }
        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        Ok(response.status().is_success())
    }

    async fn complete_once(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.prompt },
            ],
            "temperature": request.temperature.unwrap_or(self.temperature),
            "max_tokens": request.max_tokens.unwrap_or(self.max_tokens),
            "stream": false,
        });

        debug!(model = %self.model, "Sending completion request");

        let mut http_request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(key) = &self.api_key {
            http_request = http_request.header("Authorization", format!("Bearer {key}"));
        }

        let response = http_request.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout {
                    timeout_secs: self.timeout_secs,
                }
            } else {
                ProviderError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(format!("Failed to parse response: {e}")))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::MalformedResponse("No choices in response".into()))?;

        Ok(CompletionResponse {
            text: choice.message.content.unwrap_or_default(),
            model: api_response.model,
        })
    }
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        "openai-compat"
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = Duration::from_millis(500 * (1 << (attempt - 1)));
                debug!(attempt, ?backoff, "Retrying completion after transient failure");
                tokio::time::sleep(backoff).await;
            }

            match self.complete_once(&request).await {
                Ok(response) => return Ok(response),
                // Retry only transient failures; client errors surface at once
                Err(e @ ProviderError::Network(_))
                | Err(e @ ProviderError::Timeout { .. }) => last_err = Some(e),
                Err(e @ ProviderError::ApiError { status_code, .. }) if status_code >= 500 => {
                    last_err = Some(e)
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or_else(|| ProviderError::Network("no attempts made".into())))
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OpenAiCompatProvider {
        OpenAiCompatProvider::from_config(&LlmConfig::default()).unwrap()
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let p = OpenAiCompatProvider::new(
            "http://127.0.0.1:1234/v1/",
            "local-model",
            None,
            0.7,
            1024,
            30,
            1,
        )
        .unwrap();
        assert_eq!(p.base_url, "http://127.0.0.1:1234/v1");
    }

    #[test]
    fn default_config_points_at_lm_studio() {
        let p = provider();
        assert_eq!(p.base_url, "http://127.0.0.1:1234/v1");
        assert_eq!(p.model(), "local-model");
    }

    #[test]
    fn parse_completion_response() {
        let data = r#"{
            "model": "qwen2.5-32b-instruct",
            "choices": [{"message": {"role": "assistant", "content": "Thought: ok"}}]
        }"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.model.as_deref(), Some("qwen2.5-32b-instruct"));
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("Thought: ok")
        );
    }

    #[test]
    fn parse_response_without_content() {
        let data = r#"{"choices": [{"message": {"role": "assistant"}}]}"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
        assert!(parsed.model.is_none());
    }

    #[tokio::test]
    async fn unreachable_backend_is_network_error() {
        // Port 9 (discard) is never an HTTP server
        let p = OpenAiCompatProvider::new("http://127.0.0.1:9/v1", "m", None, 0.7, 16, 1, 0)
            .unwrap();
        let err = p
            .complete(CompletionRequest::new("sys", "hi"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Network(_) | ProviderError::Timeout { .. }
        ));
    }
}
