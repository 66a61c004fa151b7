//! Tool dispatch and builtin capabilities for Agentloom.
//!
//! The reasoning loop hands every parsed action to [`ToolDispatcher`],
//! which resolves the name against the agent's registry and executes the
//! bound invocation (in-process, subprocess, or HTTP). Malformed arguments
//! go through [`parse`] recovery first; unknown names come back as error
//! observations with [`matcher`] suggestions. [`builtin`] supplies the
//! deterministic mock back-ends used for prototyping.

pub mod builtin;
pub mod dispatcher;
pub mod matcher;
pub mod parse;

pub use builtin::{build_registry, builtin_catalog};
pub use dispatcher::{ToolDispatcher, DEFAULT_OBSERVATION_MAX_BYTES};
