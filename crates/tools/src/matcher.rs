//! Close-match suggestions for unknown tool names.
//!
//! When the model asks for a tool that is not registered, the error
//! observation should help it self-correct on the next iteration. Matching
//! is suggestion-only: a near miss is never silently executed as if the
//! model had named it correctly.

const ACTION_WORDS: &[&str] = &[
    "search", "send", "create", "calculate", "analyze", "schedule", "get", "fetch", "read",
    "write", "plan",
];

/// Rank registered tools by similarity to a requested name.
///
/// Exact match after normalization wins outright. Otherwise substring
/// containment in either direction outranks keyword overlap, and shared
/// action verbs (search, send, create, ...) break ties toward tools that
/// do the same kind of thing. Returns at most three names, best first.
pub fn suggest<'a>(requested: &str, available: &[&'a str]) -> Vec<&'a str> {
    let wanted = normalize(requested);
    if wanted.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(u32, &'a str)> = Vec::new();
    for &name in available {
        let candidate = normalize(name);
        if candidate == wanted {
            return vec![name];
        }

        let mut score = 0u32;
        if candidate.contains(&wanted) || wanted.contains(&candidate) {
            score += 100;
        }

        let wanted_words: Vec<&str> = wanted.split('_').filter(|w| !w.is_empty()).collect();
        let candidate_words: Vec<&str> = candidate.split('_').filter(|w| !w.is_empty()).collect();
        for word in &wanted_words {
            if candidate_words.contains(word) {
                score += 10;
                if ACTION_WORDS.contains(word) {
                    score += 5;
                }
            }
        }

        if score > 0 {
            scored.push((score, name));
        }
    }

    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(b.1)));
    scored.into_iter().take(3).map(|(_, name)| name).collect()
}

/// Build the observation text for an unknown tool request.
pub fn unknown_tool_message(requested: &str, available: &[&str]) -> String {
    let suggestions = suggest(requested, available);
    if suggestions.is_empty() {
        format!(
            "Tool '{}' is not available. Available tools: {}",
            requested,
            available.join(", ")
        )
    } else {
        format!(
            "Tool '{}' is not available. Did you mean: {}?",
            requested,
            suggestions.join(", ")
        )
    }
}

/// Lowercase and collapse every non-alphanumeric run into one underscore.
fn normalize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_sep = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_was_sep = false;
        } else if !last_was_sep {
            out.push('_');
            last_was_sep = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}
