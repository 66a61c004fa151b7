//! Multi-agent workflow orchestration for Agentloom.
//!
//! A workflow descriptor declares a roster of agents and a topology
//! pattern; [`graph`] lowers the pattern into an explicit dependency graph
//! and [`runner`] executes it: ready agents run concurrently, dependency
//! outputs flow forward as context, and every attempt is recorded in the
//! JSON audit.

pub mod graph;
pub mod runner;

pub use graph::{Pattern, WorkflowGraph};
pub use runner::{
    AgentResult, AgentStatus, RunRecord, WorkflowResult, WorkflowRunner, WorkflowState,
    WorkflowStatus,
};
