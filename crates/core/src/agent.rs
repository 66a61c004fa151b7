//! Agent identity and per-agent execution settings.

use serde::{Deserialize, Serialize};

/// What the orchestrator does when an agent exhausts its own retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ErrorPolicy {
    /// Re-run the whole agent up to `max_attempts` times with exponential
    /// backoff between attempts.
    Retry { max_attempts: u32 },

    /// Record the failure, substitute a placeholder output, and let
    /// downstream agents proceed.
    Skip,

    /// Abort the workflow; outstanding agents are cancelled.
    Fail,
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        ErrorPolicy::Retry { max_attempts: 3 }
    }
}

/// One tool requirement as declared by the workflow descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRequirement {
    pub name: String,
    #[serde(default)]
    pub purpose: String,
}

/// Static configuration for one agent within a workflow.
///
/// Assembled from the workflow descriptor; immutable once the workflow
/// starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Stable identifier, unique within the workflow.
    pub agent_id: String,

    /// Human-readable name.
    pub agent_name: String,

    /// Ordinal position in the descriptor (drives Pipeline ordering).
    #[serde(default)]
    pub position: u32,

    /// Role line rendered into the system prompt.
    pub role: String,

    /// Longer identity description rendered into the system prompt.
    #[serde(default)]
    pub description: String,

    /// Tools this agent is allowed to call.
    #[serde(default)]
    pub tools: Vec<ToolRequirement>,

    /// Agent ids whose outputs feed this agent's task.
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Agent ids this agent's output feeds into.
    #[serde(default)]
    pub outputs_to: Vec<String>,

    /// Failure handling for this agent.
    #[serde(default)]
    pub error_policy: ErrorPolicy,

    /// Reasoning iteration cap for this agent.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Wall-clock cap in seconds for one reasoning run.
    #[serde(default = "default_max_wall_clock_secs")]
    pub max_wall_clock_secs: u64,
}

fn default_max_iterations() -> u32 {
    8
}

fn default_max_wall_clock_secs() -> u64 {
    120
}

impl AgentConfig {
    /// Minimal config for a standalone agent (tests, `agent` subcommand).
    pub fn standalone(agent_id: impl Into<String>, role: impl Into<String>) -> Self {
        let agent_id = agent_id.into();
        Self {
            agent_name: agent_id.clone(),
            agent_id,
            position: 0,
            role: role.into(),
            description: String::new(),
            tools: Vec::new(),
            dependencies: Vec::new(),
            outputs_to: Vec::new(),
            error_policy: ErrorPolicy::default(),
            max_iterations: default_max_iterations(),
            max_wall_clock_secs: default_max_wall_clock_secs(),
        }
    }
}
