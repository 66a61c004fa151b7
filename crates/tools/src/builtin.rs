//! Builtin mock capabilities.
//!
//! Prototyping workflows run against deterministic in-process back-ends
//! instead of real services: the same parameters always produce the same
//! payload, so transcripts are reproducible and tests need no network.
//! Identifiers are derived from a stable hash of the inputs.

use agentloom_core::{Invocation, LocalTool, ToolRegistry, ToolRequirement, ToolSpec};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

/// Compute a 50/30/20 budget split from a monthly income.
struct CalculateBudget;

#[async_trait]
impl LocalTool for CalculateBudget {
    async fn call(&self, params: Value) -> Result<Value, String> {
        let income = params
            .get("income")
            .or_else(|| params.get("monthly_income"))
            .and_then(Value::as_f64)
            .ok_or_else(|| "missing numeric 'income' parameter".to_string())?;
        if income < 0.0 {
            return Err("'income' must be non-negative".into());
        }
        Ok(json!({
            "income": income,
            "needs": round2(income * 0.50),
            "wants": round2(income * 0.30),
            "savings": round2(income * 0.20),
            "rule": "50/30/20",
        }))
    }
}

/// Categorize statement transactions into fixed spending buckets.
struct AnalyzeBankStatement;

#[async_trait]
impl LocalTool for AnalyzeBankStatement {
    async fn call(&self, params: Value) -> Result<Value, String> {
        let transactions = params
            .get("transactions")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut total = 0.0;
        for tx in &transactions {
            total += tx.get("amount").and_then(Value::as_f64).unwrap_or(0.0);
        }
        // Model: fixed category shares over the observed total
        Ok(json!({
            "transaction_count": transactions.len(),
            "total_spent": round2(total),
            "categories": {
                "housing": round2(total * 0.40),
                "groceries": round2(total * 0.25),
                "transport": round2(total * 0.15),
                "other": round2(total * 0.20),
            },
        }))
    }
}

/// Pretend to send an email; the message id is a hash of the envelope.
struct SendEmail;

#[async_trait]
impl LocalTool for SendEmail {
    async fn call(&self, params: Value) -> Result<Value, String> {
        let recipient = params
            .get("recipient")
            .or_else(|| params.get("to"))
            .and_then(Value::as_str)
            .ok_or_else(|| "missing 'recipient' parameter".to_string())?;
        let subject = params
            .get("subject")
            .and_then(Value::as_str)
            .unwrap_or("(no subject)");
        Ok(json!({
            "status": "sent",
            "recipient": recipient,
            "subject": subject,
            "message_id": format!("msg-{:08x}", stable_hash(&[recipient, subject])),
        }))
    }
}

/// Pretend to book a meeting slot.
struct ScheduleMeeting;

#[async_trait]
impl LocalTool for ScheduleMeeting {
    async fn call(&self, params: Value) -> Result<Value, String> {
        let title = params
            .get("title")
            .and_then(Value::as_str)
            .ok_or_else(|| "missing 'title' parameter".to_string())?;
        let date = params
            .get("date")
            .and_then(Value::as_str)
            .unwrap_or("unspecified");
        Ok(json!({
            "status": "scheduled",
            "title": title,
            "date": date,
            "meeting_id": format!("mtg-{:08x}", stable_hash(&[title, date])),
        }))
    }
}

/// Return canned search results echoing the query.
struct SearchWeb;

#[async_trait]
impl LocalTool for SearchWeb {
    async fn call(&self, params: Value) -> Result<Value, String> {
        let query = params
            .get("query")
            .or_else(|| params.get("q"))
            .and_then(Value::as_str)
            .ok_or_else(|| "missing 'query' parameter".to_string())?;
        let results: Vec<Value> = (1..=3)
            .map(|i| {
                json!({
                    "title": format!("Result {i} for '{query}'"),
                    "url": format!("https://example.com/{:08x}/{i}", stable_hash(&[query])),
                    "snippet": format!("Summary {i} about {query}."),
                })
            })
            .collect();
        Ok(json!({ "query": query, "results": results }))
    }
}

/// Pretend to create a document.
struct CreateDoc;

#[async_trait]
impl LocalTool for CreateDoc {
    async fn call(&self, params: Value) -> Result<Value, String> {
        let title = params
            .get("title")
            .and_then(Value::as_str)
            .ok_or_else(|| "missing 'title' parameter".to_string())?;
        let content = params
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or("");
        Ok(json!({
            "status": "created",
            "title": title,
            "doc_id": format!("doc-{:08x}", stable_hash(&[title])),
            "length": content.len(),
        }))
    }
}

/// The full builtin catalog as registrable specs.
pub fn builtin_catalog() -> Vec<ToolSpec> {
    fn spec(name: &str, server: &str, purpose: &str, tool: Arc<dyn LocalTool>) -> ToolSpec {
        ToolSpec {
            name: name.into(),
            server: server.into(),
            purpose: purpose.into(),
            auth_required: false,
            invocation: Invocation::Local(tool),
        }
    }

    vec![
        spec(
            "calculate_budget",
            "finance",
            "Compute a 50/30/20 budget allocation from a monthly income",
            Arc::new(CalculateBudget),
        ),
        spec(
            "analyze_bank_statement",
            "finance",
            "Categorize bank statement transactions into spending buckets",
            Arc::new(AnalyzeBankStatement),
        ),
        spec(
            "send_email",
            "productivity",
            "Send an email to a recipient with a subject and body",
            Arc::new(SendEmail),
        ),
        spec(
            "schedule_meeting",
            "productivity",
            "Schedule a meeting with a title, date, and attendees",
            Arc::new(ScheduleMeeting),
        ),
        spec(
            "search_web",
            "research",
            "Search the web and return the top results for a query",
            Arc::new(SearchWeb),
        ),
        spec(
            "create_doc",
            "productivity",
            "Create a document with a title and content",
            Arc::new(CreateDoc),
        ),
    ]
}

/// Build a registry for one agent from its declared tool requirements.
///
/// Requirement names bind by normalized equality, so "Search Web" resolves
/// to `search_web`. A near miss never binds; suggestion-quality matching is
/// reserved for dispatch-time error messages. Unresolvable names are
/// skipped with a warning and the agent runs with whatever did resolve.
pub fn build_registry(requirements: &[ToolRequirement]) -> ToolRegistry {
    let catalog = builtin_catalog();
    let mut registry = ToolRegistry::new();

    for requirement in requirements {
        let resolved = catalog
            .iter()
            .find(|spec| normalized_eq(&spec.name, &requirement.name));
        match resolved {
            Some(spec) => {
                let mut spec = spec.clone();
                if !requirement.purpose.is_empty() {
                    spec.purpose = requirement.purpose.clone();
                }
                registry.register(spec);
            }
            None => {
                warn!(tool = %requirement.name, "No builtin capability for declared tool; skipping");
            }
        }
    }
    registry
}

fn normalized_eq(a: &str, b: &str) -> bool {
    let norm = |s: &str| {
        s.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '_'
                }
            })
            .collect::<String>()
            .split('_')
            .filter(|w| !w.is_empty())
            .collect::<Vec<_>>()
            .join("_")
    };
    norm(a) == norm(b)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// FNV-1a over the joined parts; stable across runs and platforms.
fn stable_hash(parts: &[&str]) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    for part in parts {
        for byte in part.bytes() {
            hash ^= byte as u32;
            hash = hash.wrapping_mul(0x0100_0193);
        }
        hash ^= 0x1f;
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}
