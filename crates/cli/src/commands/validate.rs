//! `agentloom validate` — Check a workflow descriptor without running it.

use agentloom_config::{DefaultsConfig, WorkflowDescriptor};
use agentloom_orchestrator::{Pattern, WorkflowGraph};
use std::path::Path;

pub fn run(descriptor_path: &Path) -> anyhow::Result<()> {
    let descriptor = WorkflowDescriptor::load_from(descriptor_path)?;

    // Descriptor-level validation already ran in load_from; also check the
    // orchestration lowers into an acyclic graph
    let configs = descriptor.to_agent_configs(&DefaultsConfig::default());
    let pattern = Pattern::parse(&descriptor.orchestration.pattern)?;
    let connections: Vec<(String, String)> = descriptor
        .orchestration
        .connections
        .iter()
        .map(|c| (c.from.clone(), c.to.clone()))
        .collect();
    let graph = WorkflowGraph::build(pattern, &configs, &connections)?;
    let order = graph.topo_order()?;

    println!("✅ {} is valid", descriptor_path.display());
    println!("  workflow: {}", descriptor.workflow_metadata.workflow_id);
    println!("  pattern:  {:?}", pattern);
    println!("  agents:   {}", descriptor.agents.len());
    println!("  order:    {}", order.join(" -> "));

    for agent in &descriptor.agents {
        let tools: Vec<&str> = agent.tools.iter().map(|t| t.name.as_str()).collect();
        println!("    {} [{}]", agent.agent_id, tools.join(", "));
    }

    Ok(())
}
