//! Tool dispatch — the single entry point between the reasoning loop and
//! tool execution.
//!
//! `dispatch` is infallible by contract: every failure mode (unknown tool,
//! bad arguments, transport error, timeout, non-zero exit) is flattened
//! into an `Error`-status [`ToolResult`] whose payload is the observation
//! the LLM sees. A dispatch failure must never abort the agent's run.

use crate::{matcher, parse};
use agentloom_core::{
    Invocation, ToolCallRequest, ToolError, ToolRegistry, ToolResult, ToolSpec,
};
use serde::Deserialize;
use serde_json::Value;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, warn};

/// Default byte cap on tool output entering the transcript.
pub const DEFAULT_OBSERVATION_MAX_BYTES: usize = 4000;

/// Routes tool call requests to their registered invocation binding.
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    http_client: reqwest::Client,
    observation_max_bytes: usize,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            http_client: reqwest::Client::new(),
            observation_max_bytes: DEFAULT_OBSERVATION_MAX_BYTES,
        }
    }

    /// Override the observation byte cap.
    pub fn with_observation_max_bytes(mut self, max_bytes: usize) -> Self {
        self.observation_max_bytes = max_bytes;
        self
    }

    /// Execute one tool call. Never returns an error: failures become
    /// `Error`-status results.
    pub async fn dispatch(&self, request: ToolCallRequest, timeout: Duration) -> ToolResult {
        // Some models embed the whole call object in the name field
        let (tool_name, parameters) =
            parse::unwrap_embedded_call(&request.tool_name, request.parameters);

        // Parameters handed over as a string get one more recovery pass
        let parameters = match parameters {
            Value::String(raw) => match parse::recover_parameters(&raw) {
                Ok(recovered) => recovered,
                Err(e) => {
                    return self.finish(ToolResult::error(
                        &tool_name,
                        format!("Could not parse parameters for '{tool_name}': {e} (input was: {raw})"),
                    ))
                }
            },
            other => other,
        };

        let Some(spec) = self.registry.resolve(&tool_name) else {
            let message = matcher::unknown_tool_message(&tool_name, &self.registry.names());
            return self.finish(ToolResult::error(&tool_name, message));
        };

        debug!(tool = %tool_name, "Dispatching tool call");

        let result = match self.execute(spec, parameters, timeout).await {
            Ok(payload) => ToolResult::success(&tool_name, payload),
            Err(e) => {
                warn!(tool = %tool_name, error = %e, "Tool call failed");
                ToolResult::error(&tool_name, e.to_string())
            }
        };
        self.finish(result)
    }

    fn finish(&self, mut result: ToolResult) -> ToolResult {
        result.payload = truncate_payload(&result.payload, self.observation_max_bytes);
        result
    }

    async fn execute(
        &self,
        spec: &ToolSpec,
        parameters: Value,
        timeout: Duration,
    ) -> Result<String, ToolError> {
        match &spec.invocation {
            Invocation::Local(tool) => {
                let outcome = tokio::time::timeout(timeout, tool.call(parameters))
                    .await
                    .map_err(|_| ToolError::Timeout {
                        tool_name: spec.name.clone(),
                        timeout_secs: timeout.as_secs(),
                    })?;
                let value = outcome.map_err(|reason| ToolError::ExecutionFailed {
                    tool_name: spec.name.clone(),
                    reason,
                })?;
                Ok(render_value(&value))
            }
            Invocation::Subprocess { command, args } => {
                self.execute_subprocess(spec, command, args, parameters, timeout)
                    .await
            }
            Invocation::Http { endpoint } => {
                self.execute_http(spec, endpoint, parameters, timeout).await
            }
        }
    }

    /// One JSON line in over stdin, one JSON line (or raw text) out over
    /// stdout. The child is killed if the timeout elapses first.
    async fn execute_subprocess(
        &self,
        spec: &ToolSpec,
        command: &str,
        args: &[String],
        parameters: Value,
        timeout: Duration,
    ) -> Result<String, ToolError> {
        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: spec.name.clone(),
                reason: format!("failed to spawn '{command}': {e}"),
            })?;

        let request_line = serde_json::json!({
            "tool_name": spec.name,
            "parameters": parameters,
        })
        .to_string();

        let exchange = async {
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(request_line.as_bytes()).await?;
                stdin.write_all(b"\n").await?;
                // Closing stdin signals the child that the request is complete
                drop(stdin);
            }

            // Drain both pipes together; a child filling one while the
            // other is still open must not stall the exchange
            let mut out = child.stdout.take();
            let mut err = child.stderr.take();
            let (stdout, stderr) = tokio::try_join!(
                async {
                    let mut buf = String::new();
                    if let Some(out) = out.as_mut() {
                        out.read_to_string(&mut buf).await?;
                    }
                    Ok::<_, std::io::Error>(buf)
                },
                async {
                    let mut buf = String::new();
                    if let Some(err) = err.as_mut() {
                        err.read_to_string(&mut buf).await?;
                    }
                    Ok::<_, std::io::Error>(buf)
                }
            )?;
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, stdout, stderr))
        };

        let (status, stdout, stderr) = tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| ToolError::Timeout {
                tool_name: spec.name.clone(),
                timeout_secs: timeout.as_secs(),
            })?
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: spec.name.clone(),
                reason: e.to_string(),
            })?;

        if !status.success() {
            let code = status.code().unwrap_or(-1);
            return Err(ToolError::ExecutionFailed {
                tool_name: spec.name.clone(),
                reason: format!("[exit code: {code}] {}", stderr.trim()),
            });
        }

        Ok(stdout.trim().to_string())
    }

    /// POST `{tool_name, parameters}`; expect `{status, result|error}`.
    async fn execute_http(
        &self,
        spec: &ToolSpec,
        endpoint: &str,
        parameters: Value,
        timeout: Duration,
    ) -> Result<String, ToolError> {
        let body = serde_json::json!({
            "tool_name": spec.name,
            "parameters": parameters,
        });

        let response = self
            .http_client
            .post(endpoint)
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ToolError::Timeout {
                        tool_name: spec.name.clone(),
                        timeout_secs: timeout.as_secs(),
                    }
                } else {
                    ToolError::ExecutionFailed {
                        tool_name: spec.name.clone(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();

        if !(200..300).contains(&status) {
            return Err(ToolError::ExecutionFailed {
                tool_name: spec.name.clone(),
                reason: format!("endpoint returned HTTP {status}: {}", text.trim()),
            });
        }

        match serde_json::from_str::<HttpToolResponse>(&text) {
            Ok(parsed) if parsed.status.as_deref() == Some("error") => {
                Err(ToolError::ExecutionFailed {
                    tool_name: spec.name.clone(),
                    reason: parsed
                        .error
                        .unwrap_or_else(|| "endpoint reported an error".into()),
                })
            }
            Ok(parsed) => Ok(parsed
                .result
                .as_ref()
                .map(render_value)
                .unwrap_or_else(|| text.trim().to_string())),
            // Endpoints that return plain text are accepted as-is
            Err(_) => Ok(text.trim().to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct HttpToolResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Strings render bare; everything else as compact JSON.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Cap a payload at `max_bytes`, cutting on a char boundary and noting the
/// original size.
fn truncate_payload(payload: &str, max_bytes: usize) -> String {
    if payload.len() <= max_bytes {
        return payload.to_string();
    }
    let mut cut = max_bytes;
    while !payload.is_char_boundary(cut) {
        cut -= 1;
    }
    format!(
        "{}... [truncated, {} bytes total]",
        &payload[..cut],
        payload.len()
    )
}
