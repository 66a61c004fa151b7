//! The Agentloom reasoning engine.
//!
//! One agent run is a bounded ReAct loop: render a prompt from the task
//! and the transcript so far, get a completion, parse it into a Thought,
//! an Action, or a Final Answer, dispatch any action as a tool call, and
//! append the observation. [`ReasoningLoop`] orchestrates the cycle;
//! [`Transcript`] is the append-only record it leaves behind.

pub mod parser;
pub mod prompt;
pub mod reasoning;
pub mod testing;
pub mod transcript;

pub use parser::{parse_reply, ParsedStep};
pub use reasoning::{LoopOutcome, LoopResult, ReasoningLoop};
pub use transcript::{EntryKind, Transcript, TranscriptEntry};
