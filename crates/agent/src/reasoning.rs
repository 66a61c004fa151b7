//! The bounded Thought → Action → Observation loop.
//!
//! One `run` drives a single agent from a task to a final answer, under
//! two budgets: an iteration cap and a wall-clock cap. The loop is
//! deliberately hard to kill — provider failures and malformed replies
//! become observations the model can react to, and budget exhaustion
//! returns a marked partial answer instead of an error.

use crate::parser::{parse_reply, ParsedStep};
use crate::prompt;
use crate::transcript::Transcript;
use agentloom_core::{
    AgentConfig, CompletionRequest, DomainEvent, EventBus, Provider, ToolCallRequest,
    ToolRegistry,
};
use agentloom_tools::{parse, ToolDispatcher};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    /// The model produced a `Final Answer`.
    Completed,

    /// An iteration or wall-clock budget ran out first.
    Exhausted,
}

/// The result of one reasoning run.
#[derive(Debug, Clone)]
pub struct LoopResult {
    /// Final answer, or a marked partial answer when exhausted.
    pub answer: String,
    pub outcome: LoopOutcome,
    pub transcript: Transcript,
    pub iterations: u32,
    pub tool_calls_made: u32,
    pub duration: Duration,
}

impl LoopResult {
    pub fn is_completed(&self) -> bool {
        self.outcome == LoopOutcome::Completed
    }
}

/// Drives one agent's ReAct loop against a provider and a tool registry.
pub struct ReasoningLoop {
    provider: Arc<dyn Provider>,
    registry: Arc<ToolRegistry>,
    dispatcher: ToolDispatcher,
    config: AgentConfig,
    event_bus: Arc<EventBus>,
    tool_timeout: Duration,
}

impl ReasoningLoop {
    pub fn new(
        provider: Arc<dyn Provider>,
        registry: Arc<ToolRegistry>,
        config: AgentConfig,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            provider,
            dispatcher: ToolDispatcher::new(registry.clone()),
            registry,
            config,
            event_bus,
            tool_timeout: Duration::from_secs(30),
        }
    }

    /// Set the per-tool-call timeout.
    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    /// Cap the bytes of tool output entering the transcript.
    pub fn with_observation_max_bytes(mut self, max_bytes: usize) -> Self {
        self.dispatcher =
            ToolDispatcher::new(self.registry.clone()).with_observation_max_bytes(max_bytes);
        self
    }

    /// Run the loop to completion or exhaustion. Infallible: every failure
    /// mode ends up inside the transcript or the marked partial answer.
    pub async fn run(&self, task: &str, upstream_context: &str) -> LoopResult {
        let start = Instant::now();
        let wall_clock = Duration::from_secs(self.config.max_wall_clock_secs);
        let mut transcript = Transcript::new(self.config.max_iterations);
        let mut tool_calls_made = 0u32;
        let system = prompt::system_prompt(&self.config, &self.registry);

        info!(
            agent = %self.config.agent_id,
            max_iterations = self.config.max_iterations,
            "Reasoning loop starting"
        );

        loop {
            if start.elapsed() >= wall_clock {
                warn!(agent = %self.config.agent_id, "Wall-clock budget exhausted");
                return self.exhausted(transcript, tool_calls_made, start, "wall-clock limit");
            }
            if !transcript.tick() {
                warn!(
                    agent = %self.config.agent_id,
                    iterations = self.config.max_iterations,
                    "Iteration budget exhausted"
                );
                return self.exhausted(transcript, tool_calls_made, start, "iteration limit");
            }

            debug!(agent = %self.config.agent_id, iteration = transcript.iterations, "Iteration");

            let request = CompletionRequest::new(
                system.clone(),
                prompt::user_prompt(task, upstream_context, &transcript),
            );

            let llm_start = Instant::now();
            let reply = match self.provider.complete(request).await {
                Ok(response) => {
                    self.event_bus.publish(DomainEvent::LlmCallCompleted {
                        agent_id: self.config.agent_id.clone(),
                        model: response.model.unwrap_or_default(),
                        duration_ms: llm_start.elapsed().as_millis() as u64,
                        timestamp: chrono::Utc::now(),
                    });
                    response.text
                }
                Err(e) => {
                    // Burn the iteration and let the next prompt carry the
                    // failure as an observation
                    warn!(agent = %self.config.agent_id, error = %e, "LLM call failed");
                    transcript.add_observation(format!("LLM call failed: {e}"));
                    continue;
                }
            };

            match parse_reply(&reply) {
                ParsedStep::FinalAnswer { thought, answer } => {
                    if let Some(thought) = thought {
                        transcript.add_thought(thought);
                    }
                    transcript.add_final_answer(&answer);
                    info!(
                        agent = %self.config.agent_id,
                        iterations = transcript.iterations,
                        tool_calls = tool_calls_made,
                        "Reasoning loop completed"
                    );
                    let iterations = transcript.iterations;
                    return LoopResult {
                        answer,
                        outcome: LoopOutcome::Completed,
                        transcript,
                        iterations,
                        tool_calls_made,
                        duration: start.elapsed(),
                    };
                }
                ParsedStep::Action {
                    thought,
                    tool_name,
                    raw_input,
                } => {
                    if let Some(thought) = thought {
                        transcript.add_thought(thought);
                    }
                    transcript.add_action(format!("{tool_name}({raw_input})"));

                    let parameters = parse::recover_parameters(&raw_input)
                        .unwrap_or(Value::String(raw_input));
                    let request = ToolCallRequest {
                        tool_name,
                        parameters,
                    };

                    let tool_start = Instant::now();
                    let result = self.dispatcher.dispatch(request, self.tool_timeout).await;
                    tool_calls_made += 1;

                    self.event_bus.publish(DomainEvent::ToolDispatched {
                        agent_id: self.config.agent_id.clone(),
                        tool_name: result.tool_name.clone(),
                        success: result.is_success(),
                        duration_ms: tool_start.elapsed().as_millis() as u64,
                        timestamp: chrono::Utc::now(),
                    });

                    transcript.add_observation(&result.payload);
                }
                ParsedStep::Unstructured { text } => {
                    // Keep the text as a thought and nudge the model back
                    // into the format
                    transcript.add_thought(&text);
                    transcript.add_observation(
                        "Your reply did not contain an Action or a Final Answer. \
                         Continue using the required format.",
                    );
                }
            }
        }
    }

    fn exhausted(
        &self,
        transcript: Transcript,
        tool_calls_made: u32,
        start: Instant,
        which: &str,
    ) -> LoopResult {
        // The last thought is the model's own text; observations are only a
        // fallback since they can be loop boilerplate (nudges, tool errors).
        let partial = transcript
            .last_thought()
            .or_else(|| transcript.last_observation())
            .map(|text| format!(" Partial findings: {text}"))
            .unwrap_or_default();
        let answer = format!(
            "[BUDGET EXHAUSTED: {which} after {} iterations]{partial}",
            transcript.iterations
        );
        let iterations = transcript.iterations;
        LoopResult {
            answer,
            outcome: LoopOutcome::Exhausted,
            transcript,
            iterations,
            tool_calls_made,
            duration: start.elapsed(),
        }
    }
}
