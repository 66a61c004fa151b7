//! Prompt rendering for the text-format ReAct protocol.
//!
//! Local models are held to the format by an explicit template rather than
//! native tool calling: the system prompt states the agent identity, the
//! tool roster, and the exact Thought/Action/Action Input/Observation
//! grammar. The user prompt carries the task plus the rendered transcript
//! and ends with a dangling `Thought:` cue.

use crate::transcript::Transcript;
use agentloom_core::{AgentConfig, ToolRegistry};

/// Render the system prompt for one agent.
pub fn system_prompt(config: &AgentConfig, registry: &ToolRegistry) -> String {
    let mut tool_lines = String::new();
    for spec in registry.specs() {
        tool_lines.push_str(&format!("- {}: {}\n", spec.name, spec.purpose));
    }
    if tool_lines.is_empty() {
        tool_lines.push_str("(no tools available; answer from reasoning alone)\n");
    }

    let tool_names: Vec<&str> = registry.names();
    let mut identity = format!("You are {}, {}.", config.agent_name, config.role);
    if !config.description.is_empty() {
        identity.push(' ');
        identity.push_str(&config.description);
    }

    format!(
        "{identity}\n\n\
         You have access to the following tools:\n\
         {tool_lines}\n\
         Use the following format EXACTLY:\n\n\
         Question: the task you must complete\n\
         Thought: think about what to do next\n\
         Action: the tool to use, one of [{names}]\n\
         Action Input: the arguments for the tool as a JSON object\n\
         Observation: the result of the action\n\
         ... (Thought/Action/Action Input/Observation can repeat)\n\
         Thought: I now know the final answer\n\
         Final Answer: the complete answer to the original question\n\n\
         Begin!",
        names = tool_names.join(", "),
    )
}

/// Render the user prompt: task, prior context, transcript so far, and the
/// cue for the next step.
pub fn user_prompt(task: &str, upstream_context: &str, transcript: &Transcript) -> String {
    let mut out = String::new();
    if !upstream_context.is_empty() {
        out.push_str("Context from earlier steps:\n");
        out.push_str(upstream_context);
        out.push_str("\n\n");
    }
    out.push_str("Question: ");
    out.push_str(task);
    out.push('\n');
    out.push_str(&transcript.render());
    out.push_str("Thought:");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentloom_core::ToolRequirement;

    fn config() -> AgentConfig {
        let mut c = AgentConfig::standalone("budget_planner", "Plan monthly budgets");
        c.agent_name = "Budget Planner".into();
        c.tools = vec![ToolRequirement {
            name: "calculate_budget".into(),
            purpose: String::new(),
        }];
        c
    }

    #[test]
    fn system_prompt_lists_tools_and_format() {
        let registry = agentloom_tools::build_registry(&config().tools);
        let prompt = system_prompt(&config(), &registry);
        assert!(prompt.contains("You are Budget Planner"));
        assert!(prompt.contains("- calculate_budget:"));
        assert!(prompt.contains("Use the following format EXACTLY"));
        assert!(prompt.contains("Final Answer:"));
        assert!(prompt.contains("[calculate_budget]"));
    }

    #[test]
    fn system_prompt_without_tools_says_so() {
        let registry = ToolRegistry::new();
        let prompt = system_prompt(&config(), &registry);
        assert!(prompt.contains("no tools available"));
    }

    #[test]
    fn user_prompt_ends_with_thought_cue() {
        let transcript = Transcript::new(3);
        let prompt = user_prompt("Plan a budget for 3000 EUR", "", &transcript);
        assert!(prompt.starts_with("Question: Plan a budget"));
        assert!(prompt.ends_with("Thought:"));
    }

    #[test]
    fn user_prompt_includes_upstream_context() {
        let transcript = Transcript::new(3);
        let prompt = user_prompt("Summarize", "--- output of statement_reader ---\nfoo", &transcript);
        assert!(prompt.contains("Context from earlier steps:"));
        assert!(prompt.contains("statement_reader"));
    }

    #[test]
    fn user_prompt_carries_transcript() {
        let mut transcript = Transcript::new(3);
        transcript.add_thought("use the calculator");
        transcript.add_action("calculate_budget({\"income\": 3000})");
        transcript.add_observation("{\"needs\": 1500.0}");
        let prompt = user_prompt("Plan", "", &transcript);
        assert!(prompt.contains("Thought: use the calculator"));
        assert!(prompt.contains("Observation: {\"needs\": 1500.0}"));
    }
}
