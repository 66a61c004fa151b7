//! Workflow descriptor — the JSON document that declares a multi-agent
//! workflow: metadata, agent roster, and orchestration topology.
//!
//! Descriptors are produced by an upstream design step and consumed here.
//! Validation is fail-fast and names the offending agent and field so a
//! malformed descriptor is rejected before any agent runs.

use agentloom_core::{AgentConfig, ErrorPolicy, ToolRequirement};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Top-level workflow descriptor document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDescriptor {
    pub workflow_metadata: WorkflowMetadata,
    pub agents: Vec<DescriptorAgent>,
    pub orchestration: Orchestration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowMetadata {
    pub workflow_id: String,

    /// Business domain label (e.g. "personal_finance")
    #[serde(default)]
    pub domain: String,

    /// Architecture chosen upstream (informational; `orchestration.pattern`
    /// is what actually drives execution)
    #[serde(default)]
    pub selected_architecture: String,
}

/// One agent entry as declared in the descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescriptorAgent {
    pub agent_id: String,
    pub agent_name: String,

    #[serde(default)]
    pub position: u32,

    pub identity: Identity,

    #[serde(default)]
    pub tools: Vec<ToolRequirement>,

    #[serde(default)]
    pub interface: Interface,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub role: String,

    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Interface {
    #[serde(default)]
    pub dependencies: Vec<String>,

    #[serde(default)]
    pub outputs_to: Vec<String>,

    /// "retry", "skip", or "fail"
    #[serde(default)]
    pub error_strategy: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Orchestration {
    /// Pattern name, matched case-insensitively (e.g. "Pipeline",
    /// "hub_and_spoke", "hierarchical")
    pub pattern: String,

    #[serde(default)]
    pub connections: Vec<Connection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub from: String,
    pub to: String,
}

impl WorkflowDescriptor {
    /// Load and validate a descriptor from a JSON file.
    pub fn load_from(path: &Path) -> Result<Self, DescriptorError> {
        let content = std::fs::read_to_string(path).map_err(|e| DescriptorError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    /// Parse and validate a descriptor from a JSON string.
    pub fn from_json(content: &str) -> Result<Self, DescriptorError> {
        let descriptor: Self =
            serde_json::from_str(content).map_err(|e| DescriptorError::Parse(e.to_string()))?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Semantic validation, fail-fast with the offending agent named.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        if self.agents.is_empty() {
            return Err(DescriptorError::Invalid(
                "descriptor declares no agents".into(),
            ));
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for agent in &self.agents {
            if agent.agent_id.is_empty() {
                return Err(DescriptorError::Invalid(format!(
                    "agent '{}' has an empty agent_id",
                    agent.agent_name
                )));
            }
            if !seen.insert(agent.agent_id.as_str()) {
                return Err(DescriptorError::Invalid(format!(
                    "duplicate agent_id '{}'",
                    agent.agent_id
                )));
            }
            if let Some(strategy) = &agent.interface.error_strategy {
                parse_error_strategy(strategy).ok_or_else(|| {
                    DescriptorError::Invalid(format!(
                        "agent '{}' has unknown error_strategy '{}' (expected retry, skip, or fail)",
                        agent.agent_id, strategy
                    ))
                })?;
            }
        }

        let ids: HashSet<&str> = self.agents.iter().map(|a| a.agent_id.as_str()).collect();
        for agent in &self.agents {
            for dep in &agent.interface.dependencies {
                if !ids.contains(dep.as_str()) {
                    return Err(DescriptorError::Invalid(format!(
                        "agent '{}' depends on unknown agent '{}'",
                        agent.agent_id, dep
                    )));
                }
            }
            for out in &agent.interface.outputs_to {
                if !ids.contains(out.as_str()) {
                    return Err(DescriptorError::Invalid(format!(
                        "agent '{}' outputs to unknown agent '{}'",
                        agent.agent_id, out
                    )));
                }
            }
        }

        for conn in &self.orchestration.connections {
            if !ids.contains(conn.from.as_str()) || !ids.contains(conn.to.as_str()) {
                return Err(DescriptorError::Invalid(format!(
                    "connection '{}' -> '{}' references an unknown agent",
                    conn.from, conn.to
                )));
            }
        }

        Ok(())
    }

    /// Build the runtime agent configs, filling caps from `defaults`.
    pub fn to_agent_configs(&self, defaults: &crate::DefaultsConfig) -> Vec<AgentConfig> {
        self.agents
            .iter()
            .map(|agent| AgentConfig {
                agent_id: agent.agent_id.clone(),
                agent_name: agent.agent_name.clone(),
                position: agent.position,
                role: agent.identity.role.clone(),
                description: agent.identity.description.clone(),
                tools: agent.tools.clone(),
                dependencies: agent.interface.dependencies.clone(),
                outputs_to: agent.interface.outputs_to.clone(),
                error_policy: agent
                    .interface
                    .error_strategy
                    .as_deref()
                    .and_then(parse_error_strategy)
                    .unwrap_or_default(),
                max_iterations: defaults.max_iterations,
                max_wall_clock_secs: defaults.max_wall_clock_secs,
            })
            .collect()
    }
}

fn parse_error_strategy(strategy: &str) -> Option<ErrorPolicy> {
    match strategy.trim().to_ascii_lowercase().as_str() {
        "retry" => Some(ErrorPolicy::Retry { max_attempts: 3 }),
        "skip" => Some(ErrorPolicy::Skip),
        "fail" => Some(ErrorPolicy::Fail),
        _ => None,
    }
}

/// Descriptor loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    #[error("Failed to read descriptor at {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to parse descriptor JSON: {0}")]
    Parse(String),

    #[error("Invalid descriptor: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "workflow_metadata": {
                "workflow_id": "personal_finance_wf",
                "domain": "personal_finance",
                "selected_architecture": "Pipeline"
            },
            "agents": [
                {
                    "agent_id": "statement_reader",
                    "agent_name": "Statement Reader",
                    "position": 1,
                    "identity": {
                        "role": "Read bank statements",
                        "description": "Extracts transactions from statements"
                    },
                    "tools": [{"name": "analyze_bank_statement", "purpose": "Parse statements"}],
                    "interface": {"dependencies": [], "outputs_to": ["budget_planner"], "error_strategy": "retry"}
                },
                {
                    "agent_id": "budget_planner",
                    "agent_name": "Budget Planner",
                    "position": 2,
                    "identity": {"role": "Plan budgets"},
                    "tools": [{"name": "calculate_budget", "purpose": "Compute allocations"}],
                    "interface": {"dependencies": ["statement_reader"], "outputs_to": [], "error_strategy": "skip"}
                }
            ],
            "orchestration": {
                "pattern": "pipeline",
                "connections": [{"from": "statement_reader", "to": "budget_planner"}]
            }
        }"#
    }

    #[test]
    fn valid_descriptor_parses() {
        let descriptor = WorkflowDescriptor::from_json(sample_json()).unwrap();
        assert_eq!(descriptor.agents.len(), 2);
        assert_eq!(descriptor.orchestration.pattern, "pipeline");
    }

    #[test]
    fn missing_required_field_names_it() {
        let err = WorkflowDescriptor::from_json(r#"{"agents": [], "orchestration": {"pattern": "pipeline"}}"#)
            .unwrap_err();
        match err {
            DescriptorError::Parse(msg) => assert!(msg.contains("workflow_metadata")),
            other => panic!("expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_agent_id_rejected() {
        let json = sample_json().replace("budget_planner", "statement_reader");
        let err = WorkflowDescriptor::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("duplicate agent_id"));
    }

    #[test]
    fn unknown_dependency_rejected() {
        let json = sample_json().replace(
            r#""dependencies": ["statement_reader"]"#,
            r#""dependencies": ["ghost_agent"]"#,
        );
        let err = WorkflowDescriptor::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("ghost_agent"));
    }

    #[test]
    fn unknown_error_strategy_rejected() {
        let json = sample_json().replace("\"skip\"", "\"explode\"");
        let err = WorkflowDescriptor::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("error_strategy"));
    }

    #[test]
    fn to_agent_configs_fills_defaults() {
        let descriptor = WorkflowDescriptor::from_json(sample_json()).unwrap();
        let defaults = crate::DefaultsConfig::default();
        let configs = descriptor.to_agent_configs(&defaults);
        assert_eq!(configs.len(), 2);
        assert_eq!(configs[0].max_iterations, defaults.max_iterations);
        assert_eq!(configs[0].error_policy, ErrorPolicy::Retry { max_attempts: 3 });
        assert_eq!(configs[1].error_policy, ErrorPolicy::Skip);
        assert_eq!(configs[1].dependencies, vec!["statement_reader"]);
    }
}
