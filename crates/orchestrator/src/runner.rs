//! Workflow execution — scheduling, error policies, and the audit record.
//!
//! The runner walks the workflow graph, spawning every ready agent
//! concurrently on a `JoinSet` and feeding dependency outputs forward as
//! labeled context. Each attempt of each agent leaves exactly one
//! [`RunRecord`] in the shared [`WorkflowState`]; the state is append-only
//! behind a mutex and becomes the JSON audit in [`WorkflowResult`].
//!
//! # Error policies
//!
//! An attempt "fails" when the reasoning loop exhausts its budget instead
//! of producing a final answer. What happens next is the agent's policy:
//!
//! - `Retry` re-runs the agent with exponential backoff; if every attempt
//!   exhausts, the marked partial answer is still forwarded downstream and
//!   the workflow ends `PartiallyCompleted`.
//! - `Skip` records the failure, substitutes a `[SKIPPED: ...]`
//!   placeholder, and lets downstream agents proceed.
//! - `Fail` cancels all outstanding agents and ends the workflow `Failed`
//!   with the partial audit intact.

use crate::graph::{Pattern, WorkflowGraph};
use agentloom_agent::{LoopOutcome, ReasoningLoop};
use agentloom_config::{DefaultsConfig, WorkflowDescriptor};
use agentloom_core::{
    AgentConfig, DomainEvent, ErrorPolicy, EventBus, Provider, WorkflowError,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Terminal status of the whole workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// Every agent produced a final answer.
    Completed,

    /// At least one agent was skipped or exhausted its budget; downstream
    /// agents still ran.
    PartiallyCompleted,

    /// A `Fail`-policy agent failed; outstanding agents were cancelled.
    Failed,
}

/// Terminal status of one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Completed,
    Exhausted,
    Skipped,
    Failed,
    Cancelled,
}

/// One attempt of one agent. Append-only once recorded.
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub agent_id: String,
    pub attempt: u32,
    /// "completed" or "exhausted" for finished attempts, "cancelled" for
    /// attempts pre-empted by a workflow abort.
    pub outcome: String,
    pub answer: String,
    pub iterations: u32,
    pub tool_calls_made: u32,
    pub duration_ms: u64,
    pub started_at: DateTime<Utc>,
}

/// Shared, append-only run history.
#[derive(Debug, Default, Serialize)]
pub struct WorkflowState {
    pub records: Vec<RunRecord>,
}

impl WorkflowState {
    fn append(&mut self, record: RunRecord) {
        self.records.push(record);
    }
}

/// Per-agent terminal summary in the audit.
#[derive(Debug, Clone, Serialize)]
pub struct AgentResult {
    pub agent_id: String,
    pub status: AgentStatus,
    pub attempts: u32,
    /// What downstream agents received from this agent.
    pub output: String,
    /// Wall-clock time across all attempts, including backoff.
    pub duration_ms: u64,
    /// The failed attempt's marked partial answer; `None` on success.
    pub error: Option<String>,
}

/// The JSON audit document returned by [`WorkflowRunner::run`].
#[derive(Debug, Serialize)]
pub struct WorkflowResult {
    pub workflow_id: String,
    /// Unique id for this execution of the workflow.
    pub run_id: String,
    pub status: WorkflowStatus,
    pub agents: Vec<AgentResult>,
    pub records: Vec<RunRecord>,
    /// Output of the final agent in topological order.
    pub final_output: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl WorkflowResult {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Executes a workflow descriptor against one provider.
pub struct WorkflowRunner {
    provider: Arc<dyn Provider>,
    defaults: DefaultsConfig,
    event_bus: Arc<EventBus>,
}

impl WorkflowRunner {
    pub fn new(
        provider: Arc<dyn Provider>,
        defaults: DefaultsConfig,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            provider,
            defaults,
            event_bus,
        }
    }

    /// Run the whole workflow for one task.
    pub async fn run(
        &self,
        descriptor: &WorkflowDescriptor,
        task: &str,
    ) -> Result<WorkflowResult, WorkflowError> {
        let started_at = Utc::now();
        let start = std::time::Instant::now();
        let run_id = Uuid::new_v4().to_string();

        let configs = descriptor.to_agent_configs(&self.defaults);
        let pattern = Pattern::parse(&descriptor.orchestration.pattern)?;
        let connections: Vec<(String, String)> = descriptor
            .orchestration
            .connections
            .iter()
            .map(|c| (c.from.clone(), c.to.clone()))
            .collect();
        let graph = WorkflowGraph::build(pattern, &configs, &connections)?;
        let topo = graph.topo_order()?;
        let configs_by_id: HashMap<String, AgentConfig> = configs
            .into_iter()
            .map(|c| (c.agent_id.clone(), c))
            .collect();

        info!(
            workflow = %descriptor.workflow_metadata.workflow_id,
            run = %run_id,
            agents = graph.len(),
            ?pattern,
            "Workflow starting"
        );

        let state = Arc::new(Mutex::new(WorkflowState::default()));
        let cancel = CancellationToken::new();
        let mut join_set: JoinSet<AgentOutcome> = JoinSet::new();

        let mut done: HashSet<String> = HashSet::new();
        let mut running: HashSet<String> = HashSet::new();
        let mut outputs: HashMap<String, String> = HashMap::new();
        let mut results: HashMap<String, AgentResult> = HashMap::new();
        let mut aborted = false;

        loop {
            if !aborted {
                for agent_id in graph.ready_agents(&done, &running) {
                    let config = configs_by_id
                        .get(&agent_id)
                        .cloned()
                        .ok_or_else(|| WorkflowError::Descriptor(format!(
                            "agent '{agent_id}' missing from roster"
                        )))?;
                    let context = upstream_context(&graph, &agent_id, &outputs);
                    running.insert(agent_id.clone());
                    join_set.spawn(run_agent(
                        self.provider.clone(),
                        config,
                        self.defaults.clone(),
                        self.event_bus.clone(),
                        state.clone(),
                        cancel.clone(),
                        task.to_string(),
                        context,
                    ));
                }
            }

            let Some(joined) = join_set.join_next().await else {
                break;
            };
            let outcome = joined.map_err(|e| {
                error!(error = %e, "Agent task panicked");
                WorkflowError::AgentFailed {
                    agent_id: "unknown".into(),
                    reason: e.to_string(),
                }
            })?;

            running.remove(&outcome.agent_id);
            done.insert(outcome.agent_id.clone());
            outputs.insert(outcome.agent_id.clone(), outcome.output.clone());

            self.event_bus.publish(DomainEvent::AgentCompleted {
                agent_id: outcome.agent_id.clone(),
                outcome: status_label(outcome.status).into(),
                iterations: outcome.iterations,
                timestamp: Utc::now(),
            });

            if outcome.abort {
                warn!(agent = %outcome.agent_id, "Fail policy triggered, cancelling workflow");
                cancel.cancel();
                aborted = true;
            }

            results.insert(
                outcome.agent_id.clone(),
                AgentResult {
                    agent_id: outcome.agent_id.clone(),
                    status: outcome.status,
                    attempts: outcome.attempts,
                    output: outcome.output,
                    duration_ms: outcome.duration_ms,
                    error: outcome.error,
                },
            );
        }

        let status = if aborted {
            WorkflowStatus::Failed
        } else if results
            .values()
            .all(|r| r.status == AgentStatus::Completed)
        {
            WorkflowStatus::Completed
        } else {
            WorkflowStatus::PartiallyCompleted
        };

        // Audit in deterministic topological order; agents that never ran
        // (cancelled before start) appear as cancelled with empty output
        let agents: Vec<AgentResult> = topo
            .iter()
            .map(|id| {
                results.get(id).cloned().unwrap_or_else(|| AgentResult {
                    agent_id: id.clone(),
                    status: AgentStatus::Cancelled,
                    attempts: 0,
                    output: String::new(),
                    duration_ms: 0,
                    error: None,
                })
            })
            .collect();

        let final_output = topo
            .last()
            .and_then(|id| outputs.get(id))
            .cloned()
            .unwrap_or_default();

        let records = state.lock().map_or_else(
            |poisoned| poisoned.into_inner().records.clone(),
            |state| state.records.clone(),
        );

        self.event_bus.publish(DomainEvent::WorkflowFinished {
            workflow_id: descriptor.workflow_metadata.workflow_id.clone(),
            status: match status {
                WorkflowStatus::Completed => "completed".into(),
                WorkflowStatus::PartiallyCompleted => "partially_completed".into(),
                WorkflowStatus::Failed => "failed".into(),
            },
            agents_run: agents.iter().filter(|a| a.attempts > 0).count(),
            timestamp: Utc::now(),
        });

        info!(
            workflow = %descriptor.workflow_metadata.workflow_id,
            ?status,
            duration_ms = start.elapsed().as_millis() as u64,
            "Workflow finished"
        );

        Ok(WorkflowResult {
            workflow_id: descriptor.workflow_metadata.workflow_id.clone(),
            run_id,
            status,
            agents,
            records,
            final_output,
            started_at,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

/// What one agent's spawned task reports back to the scheduler.
struct AgentOutcome {
    agent_id: String,
    status: AgentStatus,
    attempts: u32,
    iterations: u32,
    /// Text forwarded to downstream agents.
    output: String,
    duration_ms: u64,
    error: Option<String>,
    /// Whether the whole workflow must abort (Fail policy).
    abort: bool,
}

fn status_label(status: AgentStatus) -> &'static str {
    match status {
        AgentStatus::Completed => "completed",
        AgentStatus::Exhausted => "exhausted",
        AgentStatus::Skipped => "skipped",
        AgentStatus::Failed => "failed",
        AgentStatus::Cancelled => "cancelled",
    }
}

/// Concatenate dependency outputs with provenance labels.
fn upstream_context(
    graph: &WorkflowGraph,
    agent_id: &str,
    outputs: &HashMap<String, String>,
) -> String {
    let mut context = String::new();
    for dep in graph.dependencies_of(agent_id) {
        if let Some(output) = outputs.get(dep) {
            context.push_str(&format!("--- output of {dep} ---\n{output}\n"));
        }
    }
    context
}

#[allow(clippy::too_many_arguments)]
async fn run_agent(
    provider: Arc<dyn Provider>,
    config: AgentConfig,
    defaults: DefaultsConfig,
    event_bus: Arc<EventBus>,
    state: Arc<Mutex<WorkflowState>>,
    cancel: CancellationToken,
    task: String,
    context: String,
) -> AgentOutcome {
    let max_attempts = match config.error_policy {
        ErrorPolicy::Retry { max_attempts } => max_attempts.max(1),
        ErrorPolicy::Skip | ErrorPolicy::Fail => 1,
    };

    let registry = Arc::new(agentloom_tools::build_registry(&config.tools));
    let agent_id = config.agent_id.clone();
    let agent_start = std::time::Instant::now();
    let mut last_answer = String::new();
    let mut last_iterations = 0u32;

    for attempt in 1..=max_attempts {
        if cancel.is_cancelled() {
            return AgentOutcome {
                agent_id,
                status: AgentStatus::Cancelled,
                attempts: attempt - 1,
                iterations: last_iterations,
                output: String::new(),
                duration_ms: agent_start.elapsed().as_millis() as u64,
                error: None,
                abort: false,
            };
        }

        if attempt > 1 {
            let backoff =
                Duration::from_secs(defaults.retry_backoff_secs * 2u64.pow(attempt - 2));
            warn!(agent = %agent_id, attempt, ?backoff, "Retrying agent after backoff");
            tokio::select! {
                _ = cancel.cancelled() => {
                    return AgentOutcome {
                        agent_id,
                        status: AgentStatus::Cancelled,
                        attempts: attempt - 1,
                        iterations: last_iterations,
                        output: String::new(),
                        duration_ms: agent_start.elapsed().as_millis() as u64,
                        error: None,
                        abort: false,
                    };
                }
                _ = tokio::time::sleep(backoff) => {}
            }
        }

        event_bus.publish(DomainEvent::AgentStarted {
            agent_id: agent_id.clone(),
            attempt,
            timestamp: Utc::now(),
        });

        let reasoning = ReasoningLoop::new(
            provider.clone(),
            registry.clone(),
            config.clone(),
            event_bus.clone(),
        )
        .with_tool_timeout(Duration::from_secs(defaults.tool_timeout_secs))
        .with_observation_max_bytes(defaults.observation_max_bytes);

        let started_at = Utc::now();
        let result = tokio::select! {
            _ = cancel.cancelled() => {
                return AgentOutcome {
                    agent_id,
                    status: AgentStatus::Cancelled,
                    attempts: attempt,
                    iterations: last_iterations,
                    output: String::new(),
                    duration_ms: agent_start.elapsed().as_millis() as u64,
                    error: None,
                    abort: false,
                };
            }
            result = reasoning.run(&task, &context) => result,
        };

        let outcome_label = match result.outcome {
            LoopOutcome::Completed => "completed",
            LoopOutcome::Exhausted => "exhausted",
        };
        if let Ok(mut guard) = state.lock() {
            guard.append(RunRecord {
                agent_id: agent_id.clone(),
                attempt,
                outcome: outcome_label.into(),
                answer: result.answer.clone(),
                iterations: result.iterations,
                tool_calls_made: result.tool_calls_made,
                duration_ms: result.duration.as_millis() as u64,
                started_at,
            });
        }

        last_answer = result.answer;
        last_iterations = result.iterations;

        if result.outcome == LoopOutcome::Completed {
            return AgentOutcome {
                agent_id,
                status: AgentStatus::Completed,
                attempts: attempt,
                iterations: last_iterations,
                output: last_answer,
                duration_ms: agent_start.elapsed().as_millis() as u64,
                error: None,
                abort: false,
            };
        }
    }

    // Every attempt exhausted its budget; the policy decides what flows on
    let duration_ms = agent_start.elapsed().as_millis() as u64;
    match config.error_policy {
        ErrorPolicy::Retry { .. } => AgentOutcome {
            agent_id,
            status: AgentStatus::Exhausted,
            attempts: max_attempts,
            iterations: last_iterations,
            output: last_answer.clone(),
            duration_ms,
            error: Some(last_answer),
            abort: false,
        },
        ErrorPolicy::Skip => {
            let placeholder = format!("[SKIPPED: {agent_id} failed]");
            AgentOutcome {
                agent_id,
                status: AgentStatus::Skipped,
                attempts: max_attempts,
                iterations: last_iterations,
                output: placeholder,
                duration_ms,
                error: Some(last_answer),
                abort: false,
            }
        }
        ErrorPolicy::Fail => AgentOutcome {
            agent_id,
            status: AgentStatus::Failed,
            attempts: max_attempts,
            iterations: last_iterations,
            output: last_answer.clone(),
            duration_ms,
            error: Some(last_answer),
            abort: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentloom_agent::testing::SequentialMockProvider;
    use agentloom_config::WorkflowDescriptor;

    fn descriptor(pattern: &str, strategies: (&str, &str)) -> WorkflowDescriptor {
        let json = format!(
            r#"{{
                "workflow_metadata": {{
                    "workflow_id": "wf_test",
                    "domain": "personal_finance",
                    "selected_architecture": "{pattern}"
                }},
                "agents": [
                    {{
                        "agent_id": "reader",
                        "agent_name": "Reader",
                        "position": 1,
                        "identity": {{"role": "Read statements"}},
                        "tools": [{{"name": "analyze_bank_statement", "purpose": "parse"}}],
                        "interface": {{"dependencies": [], "outputs_to": ["planner"], "error_strategy": "{}"}}
                    }},
                    {{
                        "agent_id": "planner",
                        "agent_name": "Planner",
                        "position": 2,
                        "identity": {{"role": "Plan budgets"}},
                        "tools": [{{"name": "calculate_budget", "purpose": "compute"}}],
                        "interface": {{"dependencies": ["reader"], "outputs_to": [], "error_strategy": "{}"}}
                    }}
                ],
                "orchestration": {{
                    "pattern": "{pattern}",
                    "connections": [{{"from": "reader", "to": "planner"}}]
                }}
            }}"#,
            strategies.0, strategies.1
        );
        WorkflowDescriptor::from_json(&json).unwrap()
    }

    fn defaults() -> DefaultsConfig {
        let mut d = DefaultsConfig::default();
        d.max_iterations = 3;
        d.retry_backoff_secs = 0;
        d
    }

    fn runner(provider: SequentialMockProvider) -> WorkflowRunner {
        WorkflowRunner::new(
            Arc::new(provider),
            defaults(),
            Arc::new(EventBus::default()),
        )
    }

    #[tokio::test]
    async fn pipeline_completes_and_forwards_output() {
        // Each agent answers on its first turn; the mock serves both in
        // pipeline order
        let provider = SequentialMockProvider::new(vec![
            "Final Answer: Total spent 450 EUR.".into(),
            "Final Answer: Save 90 EUR monthly.".into(),
        ]);
        let result = runner(provider)
            .run(&descriptor("pipeline", ("retry", "retry")), "Plan my budget")
            .await
            .unwrap();

        assert_eq!(result.status, WorkflowStatus::Completed);
        assert_eq!(result.agents.len(), 2);
        assert_eq!(result.final_output, "Save 90 EUR monthly.");
        assert_eq!(result.records.len(), 2);
        assert!(result.records.iter().all(|r| r.outcome == "completed"));
    }

    #[tokio::test]
    async fn dependency_output_flows_into_downstream_prompt() {
        let provider = SequentialMockProvider::new(vec![
            "Final Answer: UPSTREAM-MARKER-42".into(),
            "Final Answer: done".into(),
        ]);
        let provider = Arc::new(provider);
        let runner = WorkflowRunner::new(
            provider.clone(),
            defaults(),
            Arc::new(EventBus::default()),
        );
        runner
            .run(&descriptor("pipeline", ("retry", "retry")), "task")
            .await
            .unwrap();

        let prompts = provider.seen_prompts();
        let planner_prompt = prompts.last().unwrap();
        assert!(planner_prompt.contains("--- output of reader ---"));
        assert!(planner_prompt.contains("UPSTREAM-MARKER-42"));
    }

    #[tokio::test]
    async fn skip_policy_substitutes_placeholder() {
        // Reader never answers (exhausts 3 iterations), planner answers.
        // Mock replies are consumed call by call: 3 unstructured for the
        // reader, then the planner's answer.
        let provider = SequentialMockProvider::new(vec![
            "thinking...".into(),
            "thinking...".into(),
            "thinking...".into(),
            "Final Answer: planned without statement data".into(),
        ]);
        let result = runner(provider)
            .run(&descriptor("pipeline", ("skip", "retry")), "task")
            .await
            .unwrap();

        assert_eq!(result.status, WorkflowStatus::PartiallyCompleted);
        let reader = result.agents.iter().find(|a| a.agent_id == "reader").unwrap();
        assert_eq!(reader.status, AgentStatus::Skipped);
        assert_eq!(reader.output, "[SKIPPED: reader failed]");
        let planner = result.agents.iter().find(|a| a.agent_id == "planner").unwrap();
        assert_eq!(planner.status, AgentStatus::Completed);
    }

    #[tokio::test]
    async fn fail_policy_aborts_workflow() {
        // Reader exhausts; Fail policy must cancel the planner
        let provider = SequentialMockProvider::new(vec![
            "thinking...".into(),
            "thinking...".into(),
            "thinking...".into(),
            "Final Answer: should never be needed".into(),
        ]);
        let result = runner(provider)
            .run(&descriptor("pipeline", ("fail", "retry")), "task")
            .await
            .unwrap();

        assert_eq!(result.status, WorkflowStatus::Failed);
        let reader = result.agents.iter().find(|a| a.agent_id == "reader").unwrap();
        assert_eq!(reader.status, AgentStatus::Failed);
        let planner = result.agents.iter().find(|a| a.agent_id == "planner").unwrap();
        assert_eq!(planner.status, AgentStatus::Cancelled);
        assert_eq!(planner.attempts, 0);
    }

    #[tokio::test]
    async fn independent_spokes_both_run() {
        let json = r#"{
            "workflow_metadata": {"workflow_id": "wf_hub", "domain": "", "selected_architecture": ""},
            "agents": [
                {"agent_id": "hub", "agent_name": "Hub", "position": 1,
                 "identity": {"role": "Coordinate"}, "tools": [],
                 "interface": {"dependencies": [], "outputs_to": ["s1", "s2"]}},
                {"agent_id": "s1", "agent_name": "Spoke 1", "position": 2,
                 "identity": {"role": "Work"}, "tools": [], "interface": {}},
                {"agent_id": "s2", "agent_name": "Spoke 2", "position": 3,
                 "identity": {"role": "Work"}, "tools": [], "interface": {}}
            ],
            "orchestration": {"pattern": "hub_and_spoke", "connections": [
                {"from": "hub", "to": "s1"}, {"from": "hub", "to": "s2"}
            ]}
        }"#;
        let d = WorkflowDescriptor::from_json(json).unwrap();
        // Identical replies keep the outcome stable however the two
        // concurrent spokes interleave
        let provider = SequentialMockProvider::new(vec![
            "Final Answer: coordinated".into(),
            "Final Answer: done".into(),
            "Final Answer: done".into(),
        ]);
        let result = runner(provider).run(&d, "task").await.unwrap();
        assert_eq!(result.status, WorkflowStatus::Completed);
        assert!(result.agents.iter().all(|a| a.status == AgentStatus::Completed));
        assert_eq!(result.records.len(), 3);
    }

    #[tokio::test]
    async fn retry_policy_records_each_attempt() {
        // Attempt 1 exhausts (3 unstructured replies), attempt 2 answers,
        // then planner answers
        let mut replies: Vec<String> = (0..3).map(|_| "thinking...".into()).collect();
        replies.push("Final Answer: second try worked".into());
        replies.push("Final Answer: planned".into());
        let provider = SequentialMockProvider::new(replies);
        let result = runner(provider)
            .run(&descriptor("pipeline", ("retry", "retry")), "task")
            .await
            .unwrap();

        assert_eq!(result.status, WorkflowStatus::Completed);
        let reader_records: Vec<&RunRecord> = result
            .records
            .iter()
            .filter(|r| r.agent_id == "reader")
            .collect();
        assert_eq!(reader_records.len(), 2);
        assert_eq!(reader_records[0].attempt, 1);
        assert_eq!(reader_records[0].outcome, "exhausted");
        assert_eq!(reader_records[1].attempt, 2);
        assert_eq!(reader_records[1].outcome, "completed");
    }

    #[tokio::test]
    async fn retry_exhaustion_forwards_partial_answer() {
        // Reader exhausts all 3 attempts x 3 iterations = 9 replies, then
        // the planner answers
        let mut replies: Vec<String> = (0..9).map(|_| "thinking...".into()).collect();
        replies.push("Final Answer: planned from partial data".into());
        let provider = SequentialMockProvider::new(replies);
        let result = runner(provider)
            .run(&descriptor("pipeline", ("retry", "retry")), "task")
            .await
            .unwrap();

        assert_eq!(result.status, WorkflowStatus::PartiallyCompleted);
        let reader = result.agents.iter().find(|a| a.agent_id == "reader").unwrap();
        assert_eq!(reader.status, AgentStatus::Exhausted);
        assert!(reader.output.starts_with("[BUDGET EXHAUSTED"));
        assert_eq!(reader.attempts, 3);
    }

    #[tokio::test]
    async fn agent_summary_carries_error_and_duration() {
        // Reader exhausts under Skip; its marked partial must survive in
        // the error field even though the forwarded output is a placeholder
        let provider = SequentialMockProvider::new(vec![
            "thinking...".into(),
            "thinking...".into(),
            "thinking...".into(),
            "Final Answer: planned".into(),
        ]);
        let result = runner(provider)
            .run(&descriptor("pipeline", ("skip", "retry")), "task")
            .await
            .unwrap();

        let reader = result.agents.iter().find(|a| a.agent_id == "reader").unwrap();
        let error = reader.error.as_deref().unwrap();
        assert!(error.starts_with("[BUDGET EXHAUSTED"), "error was: {error}");
        let planner = result.agents.iter().find(|a| a.agent_id == "planner").unwrap();
        assert!(planner.error.is_none());
        let json = result.to_json().unwrap();
        assert!(json.contains("\"duration_ms\""));
        assert!(json.contains("\"error\""));
    }

    #[tokio::test]
    async fn audit_json_serializes() {
        let provider = SequentialMockProvider::new(vec![
            "Final Answer: a".into(),
            "Final Answer: b".into(),
        ]);
        let result = runner(provider)
            .run(&descriptor("pipeline", ("retry", "retry")), "task")
            .await
            .unwrap();
        let json = result.to_json().unwrap();
        assert!(json.contains("\"workflow_id\": \"wf_test\""));
        assert!(json.contains("\"run_id\""));
        assert!(json.contains("\"status\": \"completed\""));
        assert!(json.contains("\"records\""));
    }

    #[tokio::test]
    async fn unknown_pattern_is_descriptor_error() {
        let mut d = descriptor("pipeline", ("retry", "retry"));
        d.orchestration.pattern = "quantum_mesh".into();
        let provider = SequentialMockProvider::new(vec!["Final Answer: x".into()]);
        let err = runner(provider).run(&d, "task").await.unwrap_err();
        assert!(err.to_string().contains("quantum_mesh"));
    }
}
