//! Reasoning transcript — the append-only record of one agent run.
//!
//! Every Thought, Action, and Observation lands here in order. The
//! transcript is both the audit trail returned to the caller and the
//! context rendered back into the next prompt, so entries are never
//! mutated or removed once appended.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of one transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Thought,
    Action,
    Observation,
    FinalAnswer,
}

/// One recorded step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub kind: EntryKind,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// The full reasoning record of one agent run, plus iteration bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub entries: Vec<TranscriptEntry>,
    pub iterations: u32,
    max_iterations: u32,
}

impl Transcript {
    pub fn new(max_iterations: u32) -> Self {
        Self {
            entries: Vec::new(),
            iterations: 0,
            max_iterations,
        }
    }

    /// Start the next iteration; `false` when the cap is spent.
    pub fn tick(&mut self) -> bool {
        if self.iterations >= self.max_iterations {
            return false;
        }
        self.iterations += 1;
        true
    }

    pub fn add_thought(&mut self, content: impl Into<String>) {
        self.push(EntryKind::Thought, content);
    }

    pub fn add_action(&mut self, content: impl Into<String>) {
        self.push(EntryKind::Action, content);
    }

    pub fn add_observation(&mut self, content: impl Into<String>) {
        self.push(EntryKind::Observation, content);
    }

    pub fn add_final_answer(&mut self, content: impl Into<String>) {
        self.push(EntryKind::FinalAnswer, content);
    }

    fn push(&mut self, kind: EntryKind, content: impl Into<String>) {
        self.entries.push(TranscriptEntry {
            kind,
            content: content.into(),
            timestamp: Utc::now(),
        });
    }

    /// Render the history in the Thought/Action/Observation text format the
    /// prompt protocol expects. Empty for a fresh run.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            let label = match entry.kind {
                EntryKind::Thought => "Thought",
                EntryKind::Action => "Action",
                EntryKind::Observation => "Observation",
                EntryKind::FinalAnswer => "Final Answer",
            };
            out.push_str(label);
            out.push_str(": ");
            out.push_str(&entry.content);
            out.push('\n');
        }
        out
    }

    /// Last entry of the given kind, if any.
    pub fn last_of(&self, kind: EntryKind) -> Option<&TranscriptEntry> {
        self.entries.iter().rev().find(|e| e.kind == kind)
    }

    /// Most recent observation text; used to salvage a partial answer when
    /// the run exhausts its budget.
    pub fn last_observation(&self) -> Option<&str> {
        self.last_of(EntryKind::Observation)
            .map(|e| e.content.as_str())
    }

    /// Most recent thought text — the last thing the model actually said.
    pub fn last_thought(&self) -> Option<&str> {
        self.last_of(EntryKind::Thought).map(|e| e.content.as_str())
    }
}
