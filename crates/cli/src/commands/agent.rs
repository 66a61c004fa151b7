//! `agentloom agent` — Run one standalone agent for a single task.

use agentloom_agent::{ReasoningLoop, Transcript};
use agentloom_config::AppConfig;
use agentloom_core::{AgentConfig, EventBus, ToolRequirement};
use agentloom_providers::OpenAiCompatProvider;
use agentloom_tools::build_registry;
use std::sync::Arc;
use std::time::Duration;

pub async fn run(task: &str, role: &str, tools: &[String]) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    config.validate()?;

    let requirements: Vec<ToolRequirement> = tools
        .iter()
        .map(|name| ToolRequirement {
            name: name.clone(),
            purpose: String::new(),
        })
        .collect();
    let registry = Arc::new(build_registry(&requirements));

    let mut agent_config = AgentConfig::standalone("standalone", role);
    agent_config.tools = requirements;
    agent_config.max_iterations = config.defaults.max_iterations;
    agent_config.max_wall_clock_secs = config.defaults.max_wall_clock_secs;

    let provider = Arc::new(OpenAiCompatProvider::from_config(&config.llm)?);
    let event_bus = Arc::new(EventBus::default());

    let reasoning = ReasoningLoop::new(provider, registry, agent_config, event_bus)
        .with_tool_timeout(Duration::from_secs(config.defaults.tool_timeout_secs))
        .with_observation_max_bytes(config.defaults.observation_max_bytes);

    let result = reasoning.run(task, "").await;

    print_transcript(&result.transcript);
    println!();
    if result.is_completed() {
        println!("{}", result.answer);
    } else {
        eprintln!("⚠️  agent exhausted its budget");
        println!("{}", result.answer);
    }
    tracing::info!(
        iterations = result.iterations,
        tool_calls = result.tool_calls_made,
        duration_ms = result.duration.as_millis() as u64,
        "agent finished"
    );

    Ok(())
}

fn print_transcript(transcript: &Transcript) {
    let rendered = transcript.render();
    if !rendered.is_empty() {
        eprintln!("--- transcript ---");
        eprint!("{rendered}");
        eprintln!("------------------");
    }
}
