//! `agentloom run` — Execute a workflow descriptor against a task.

use agentloom_config::{AppConfig, WorkflowDescriptor};
use agentloom_core::EventBus;
use agentloom_orchestrator::{WorkflowRunner, WorkflowStatus};
use agentloom_providers::OpenAiCompatProvider;
use anyhow::Context;
use std::path::Path;
use std::sync::Arc;

pub async fn run(descriptor_path: &Path, task: &str, output: Option<&Path>) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let descriptor = WorkflowDescriptor::load_from(descriptor_path)?;

    let provider = Arc::new(OpenAiCompatProvider::from_config(&config.llm)?);
    let event_bus = Arc::new(EventBus::default());

    // Live progress: echo agent lifecycle events while the workflow runs
    let mut events = event_bus.subscribe();
    let progress = tokio::spawn(async move {
        use agentloom_core::DomainEvent;
        while let Ok(event) = events.recv().await {
            match event.as_ref() {
                DomainEvent::AgentStarted {
                    agent_id, attempt, ..
                } => {
                    if *attempt > 1 {
                        println!("▶ {agent_id} (attempt {attempt})");
                    } else {
                        println!("▶ {agent_id}");
                    }
                }
                DomainEvent::AgentCompleted {
                    agent_id,
                    outcome,
                    iterations,
                    ..
                } => println!("  {agent_id}: {outcome} after {iterations} iteration(s)"),
                _ => {}
            }
        }
    });

    let runner = WorkflowRunner::new(provider, config.defaults.clone(), event_bus.clone());
    let result = runner.run(&descriptor, task).await?;
    progress.abort();

    let audit = result.to_json().context("serializing workflow audit")?;
    match output {
        Some(path) => {
            std::fs::write(path, &audit)
                .with_context(|| format!("writing audit to {}", path.display()))?;
            println!("\nAudit written to {}", path.display());
        }
        None => println!("\n{audit}"),
    }

    println!("\nFinal output:\n{}", result.final_output);

    match result.status {
        WorkflowStatus::Completed => Ok(()),
        WorkflowStatus::PartiallyCompleted => {
            eprintln!("warning: workflow partially completed");
            Ok(())
        }
        WorkflowStatus::Failed => anyhow::bail!("workflow failed; see audit for details"),
    }
}
