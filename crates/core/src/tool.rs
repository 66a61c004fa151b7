//! Tool model — declared capabilities and their invocation bindings.
//!
//! A tool is a named capability a reasoning loop can invoke as one step.
//! Each tool is declared once at agent construction as a [`ToolSpec`] and
//! resolved by name at dispatch time. The transport (in-process function,
//! subprocess, or HTTP endpoint) lives in one tagged [`Invocation`] union so
//! dispatch logic stays transport-agnostic.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// An in-process tool implementation.
///
/// Built-in mock capabilities (finance/productivity back-ends) implement
/// this trait. The error type is a plain string because every failure is
/// flattened into an `Error`-status [`ToolResult`] anyway.
#[async_trait]
pub trait LocalTool: Send + Sync {
    async fn call(
        &self,
        params: serde_json::Value,
    ) -> std::result::Result<serde_json::Value, String>;
}

/// How a declared tool is actually executed.
#[derive(Clone)]
pub enum Invocation {
    /// Call an in-process function.
    Local(Arc<dyn LocalTool>),

    /// Spawn a subprocess and exchange one JSON line over stdin/stdout.
    Subprocess { command: String, args: Vec<String> },

    /// POST `{tool_name, parameters}` to an HTTP endpoint.
    Http { endpoint: String },
}

impl std::fmt::Debug for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Invocation::Local(_) => write!(f, "Local(..)"),
            Invocation::Subprocess { command, args } => {
                write!(f, "Subprocess({command} {args:?})")
            }
            Invocation::Http { endpoint } => write!(f, "Http({endpoint})"),
        }
    }
}

/// A declared tool: name, provenance, and execution binding.
///
/// Created once at agent construction from the workflow descriptor plus the
/// builtin catalog; immutable thereafter.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    /// Unique name within one agent's registry.
    pub name: String,

    /// Which back-end server this tool belongs to (e.g. "finance").
    pub server: String,

    /// What this tool does — rendered into the agent prompt.
    pub purpose: String,

    /// Whether the back-end requires credentials.
    pub auth_required: bool,

    /// Execution binding.
    pub invocation: Invocation,
}

/// A request to execute one tool, parsed from an LLM Action/Action Input pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Name of the tool to execute.
    pub tool_name: String,

    /// Arguments as a JSON value.
    pub parameters: serde_json::Value,
}

/// Outcome status of a tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Success,
    Error,
}

/// The result of a tool invocation.
///
/// Appended verbatim into the transcript as an Observation; never mutated
/// after creation. Dispatch failures are values of this type, not errors —
/// the message text is the only feedback the LLM gets to self-correct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub status: ToolStatus,

    /// Which tool produced this result.
    pub tool_name: String,

    /// Output content (possibly truncated before entering the transcript).
    pub payload: String,

    /// Machine-readable failure detail, present on Error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl ToolResult {
    /// Create a successful result.
    pub fn success(tool_name: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            status: ToolStatus::Success,
            tool_name: tool_name.into(),
            payload: payload.into(),
            error_detail: None,
        }
    }

    /// Create a failed result. The payload doubles as the observation text.
    pub fn error(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            status: ToolStatus::Error,
            tool_name: tool_name.into(),
            payload: message.clone(),
            error_detail: Some(message),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ToolStatus::Success
    }
}

/// A registry of declared tools.
///
/// Built once per agent before any lookup happens, so no locking is needed;
/// share it behind an `Arc` after construction.
pub struct ToolRegistry {
    tools: HashMap<String, ToolSpec>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, spec: ToolSpec) {
        self.tools.insert(spec.name.clone(), spec);
    }

    /// Resolve a tool by name.
    pub fn resolve(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.get(name)
    }

    /// All registered tool names, sorted for stable error messages.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// All registered specs, sorted by name (for prompt rendering).
    pub fn specs(&self) -> Vec<&ToolSpec> {
        let mut specs: Vec<&ToolSpec> = self.tools.values().collect();
        specs.sort_unstable_by(|a, b| a.name.cmp(&b.name));
        specs
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
