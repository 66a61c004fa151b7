//! Domain event system — decoupled observability across bounded contexts.
//!
//! Events are published when something interesting happens during a run.
//! The CLI and tests subscribe to react without tight coupling to the
//! reasoning loop or orchestrator internals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// One LLM completion round-trip finished
    LlmCallCompleted {
        agent_id: String,
        model: String,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A tool call was dispatched and produced a result
    ToolDispatched {
        agent_id: String,
        tool_name: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// An agent's reasoning run started
    AgentStarted {
        agent_id: String,
        attempt: u32,
        timestamp: DateTime<Utc>,
    },

    /// An agent's reasoning run finished (completed, exhausted, or failed)
    AgentCompleted {
        agent_id: String,
        outcome: String, // "completed", "exhausted", "failed", "skipped"
        iterations: u32,
        timestamp: DateTime<Utc>,
    },

    /// The whole workflow finished
    WorkflowFinished {
        workflow_id: String,
        status: String, // "completed", "partially_completed", "failed"
        agents_run: usize,
        timestamp: DateTime<Utc>,
    },

    /// An error occurred outside the normal result paths
    ErrorOccurred {
        context: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
/// Subscribers receive all events and filter for what they care about.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // Ignore send errors (no subscribers = that's fine)
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
