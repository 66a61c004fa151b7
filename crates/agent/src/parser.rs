//! Parse one raw LLM reply into a reasoning step.
//!
//! The reply is free text that is supposed to follow the ReAct grammar,
//! but local models drift: labels change case, the action name arrives
//! wrapped in backticks, prose continues after the JSON input, or the
//! format is ignored entirely. Parsing is therefore tolerant — a reply
//! that fits no rule becomes an unstructured thought and the loop
//! continues, never an error.

use agentloom_tools::parse::trim_to_last_brace;

/// The interpreted content of one reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedStep {
    /// The model wants a tool executed.
    Action {
        thought: Option<String>,
        tool_name: String,
        raw_input: String,
    },

    /// The model declared it is done.
    FinalAnswer {
        thought: Option<String>,
        answer: String,
    },

    /// The reply fit neither rule; recorded as a thought so the run
    /// continues.
    Unstructured { text: String },
}

/// Parse a raw reply. Never fails.
pub fn parse_reply(reply: &str) -> ParsedStep {
    let text = reply.trim();

    // The answer is whatever follows the LAST marker, so a thought that
    // merely mentions the label does not clip the real answer.
    if let Some(pos) = rfind_label(text, "Final Answer:") {
        let answer = text[pos + "Final Answer:".len()..].trim().to_string();
        let thought = extract_thought(&text[..pos]);
        return ParsedStep::FinalAnswer { thought, answer };
    }

    if let Some(pos) = find_label(text, "Action:") {
        let after = &text[pos + "Action:".len()..];
        let (name_line, rest) = match after.find('\n') {
            Some(i) => (&after[..i], &after[i + 1..]),
            None => (after, ""),
        };
        let tool_name = clean_name(name_line);

        let raw_input = match find_label(rest, "Action Input:") {
            Some(ip) => {
                let input_text = &rest[ip + "Action Input:".len()..];
                // A hallucinated Observation marks where the real input ends
                let end = find_label(input_text, "Observation:").unwrap_or(input_text.len());
                trim_to_last_brace(input_text[..end].trim()).to_string()
            }
            None => String::new(),
        };

        if !tool_name.is_empty() {
            let thought = extract_thought(&text[..pos]);
            return ParsedStep::Action {
                thought,
                tool_name,
                raw_input,
            };
        }
    }

    ParsedStep::Unstructured {
        text: text.to_string(),
    }
}

/// Case-insensitive label search.
fn find_label(haystack: &str, label: &str) -> Option<usize> {
    haystack
        .to_ascii_lowercase()
        .find(&label.to_ascii_lowercase())
}

/// Case-insensitive label search, last occurrence.
fn rfind_label(haystack: &str, label: &str) -> Option<usize> {
    haystack
        .to_ascii_lowercase()
        .rfind(&label.to_ascii_lowercase())
}

/// Strip markdown and quoting noise around a tool name.
fn clean_name(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| matches!(c, '`' | '*' | '"' | '\'' | '[' | ']' | '.' | ','))
        .trim()
        .to_string()
}

/// The thought is whatever precedes the structural label, minus its own
/// `Thought:` prefix.
fn extract_thought(preamble: &str) -> Option<String> {
    let mut text = preamble.trim();
    if let Some(pos) = find_label(text, "Thought:") {
        text = text[pos + "Thought:".len()..].trim();
    }
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_action() {
        let reply = "Thought: I need the budget split.\nAction: calculate_budget\nAction Input: {\"income\": 3000}";
        match parse_reply(reply) {
            ParsedStep::Action {
                thought,
                tool_name,
                raw_input,
            } => {
                assert_eq!(thought.as_deref(), Some("I need the budget split."));
                assert_eq!(tool_name, "calculate_budget");
                assert_eq!(raw_input, "{\"income\": 3000}");
            }
            other => panic!("expected Action, got {other:?}"),
        }
    }

    #[test]
    fn final_answer_wins_over_action() {
        let reply = "Thought: done.\nFinal Answer: Allocate 1500 to needs.\nAction: calculate_budget";
        match parse_reply(reply) {
            ParsedStep::FinalAnswer { answer, .. } => {
                assert!(answer.contains("Allocate 1500"));
            }
            other => panic!("expected FinalAnswer, got {other:?}"),
        }
    }

    #[test]
    fn labels_match_case_insensitively() {
        let reply = "thought: hmm\naction: search_web\naction input: {\"query\": \"x\"}";
        match parse_reply(reply) {
            ParsedStep::Action { tool_name, .. } => assert_eq!(tool_name, "search_web"),
            other => panic!("expected Action, got {other:?}"),
        }
    }

    #[test]
    fn backticked_tool_name_cleaned() {
        let reply = "Action: `search_web`\nAction Input: {}";
        match parse_reply(reply) {
            ParsedStep::Action { tool_name, .. } => assert_eq!(tool_name, "search_web"),
            other => panic!("expected Action, got {other:?}"),
        }
    }

    #[test]
    fn hallucinated_observation_cut_from_input() {
        let reply = "Action: search_web\nAction Input: {\"query\": \"x\"}\nObservation: I found 3 results";
        match parse_reply(reply) {
            ParsedStep::Action { raw_input, .. } => {
                assert_eq!(raw_input, "{\"query\": \"x\"}");
            }
            other => panic!("expected Action, got {other:?}"),
        }
    }

    #[test]
    fn trailing_prose_after_input_trimmed() {
        let reply = "Action: send_email\nAction Input: {\"to\": \"a@b.c\"} and then I will wait";
        match parse_reply(reply) {
            ParsedStep::Action { raw_input, .. } => assert_eq!(raw_input, "{\"to\": \"a@b.c\"}"),
            other => panic!("expected Action, got {other:?}"),
        }
    }

    #[test]
    fn action_without_input_has_empty_raw() {
        let reply = "Action: search_web";
        match parse_reply(reply) {
            ParsedStep::Action {
                raw_input,
                tool_name,
                ..
            } => {
                assert_eq!(tool_name, "search_web");
                assert!(raw_input.is_empty());
            }
            other => panic!("expected Action, got {other:?}"),
        }
    }

    #[test]
    fn formatless_reply_is_unstructured() {
        let reply = "I think the budget should prioritize rent and groceries.";
        match parse_reply(reply) {
            ParsedStep::Unstructured { text } => assert!(text.contains("prioritize rent")),
            other => panic!("expected Unstructured, got {other:?}"),
        }
    }

    #[test]
    fn final_answer_without_thought() {
        let reply = "Final Answer: 42";
        match parse_reply(reply) {
            ParsedStep::FinalAnswer { thought, answer } => {
                assert!(thought.is_none());
                assert_eq!(answer, "42");
            }
            other => panic!("expected FinalAnswer, got {other:?}"),
        }
    }

    #[test]
    fn answer_taken_after_last_final_answer_marker() {
        let reply =
            "Thought: I will now give my Final Answer: after checking.\nFinal Answer: 42";
        match parse_reply(reply) {
            ParsedStep::FinalAnswer { answer, .. } => assert_eq!(answer, "42"),
            other => panic!("expected FinalAnswer, got {other:?}"),
        }
    }

    #[test]
    fn multiline_final_answer_kept_whole() {
        let reply = "Thought: done\nFinal Answer: Line one.\nLine two.\nLine three.";
        match parse_reply(reply) {
            ParsedStep::FinalAnswer { answer, .. } => {
                assert!(answer.contains("Line one."));
                assert!(answer.contains("Line three."));
            }
            other => panic!("expected FinalAnswer, got {other:?}"),
        }
    }
}
