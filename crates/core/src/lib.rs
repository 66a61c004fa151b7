//! # Agentloom Core
//!
//! Domain types, traits, and error definitions for the Agentloom workflow
//! runtime. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every subsystem is defined as a trait or a plain data type here.
//! Implementations live in their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod agent;
pub mod error;
pub mod event;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use agent::{AgentConfig, ErrorPolicy, ToolRequirement};
pub use error::{Error, ProviderError, Result, ToolError, WorkflowError};
pub use event::{DomainEvent, EventBus};
pub use provider::{CompletionRequest, CompletionResponse, Provider};
pub use tool::{
    Invocation, LocalTool, ToolCallRequest, ToolRegistry, ToolResult, ToolSpec, ToolStatus,
};
