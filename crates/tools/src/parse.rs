//! Parameter recovery for malformed tool call arguments.
//!
//! Local models routinely wrap JSON in markdown fences, trail commentary
//! after the closing brace, or nest the whole call inside the tool name
//! field. Recovery tries progressively looser strategies rather than
//! failing the call: direct parse, fence stripping, balanced-brace
//! extraction, and finally regex key/value scavenging. Each strategy
//! must yield a JSON object; anything else falls through to the next.

use regex_lite::Regex;
use serde_json::{Map, Value};

/// Recover a JSON object of parameters from raw LLM-produced text.
///
/// Errs only when every strategy fails, carrying the direct parse failure
/// so the caller can surface the exact error text. Empty or whitespace-only
/// input recovers as an empty object, since many tools take no arguments.
pub fn recover_parameters(raw: &str) -> Result<Value, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    // Strategy 1: the text is already valid JSON
    let parse_error = match serde_json::from_str::<Value>(trimmed) {
        Ok(value @ Value::Object(_)) => return Ok(value),
        Ok(_) => "valid JSON but not an object".to_string(),
        Err(e) => e.to_string(),
    };

    // Strategy 2: strip a markdown code fence and retry
    if let Some(inner) = strip_code_fence(trimmed) {
        if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(inner) {
            return Ok(value);
        }
    }

    // Strategy 3: first balanced {...} block anywhere in the text
    if let Some(block) = first_balanced_object(trimmed) {
        if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(block) {
            return Ok(value);
        }
    }

    // Strategy 4: scavenge "key": value pairs with a regex
    let scavenged = scavenge_pairs(trimmed);
    if !scavenged.is_empty() {
        return Ok(Value::Object(scavenged));
    }

    Err(parse_error)
}

/// Trim raw action input down to its last closing brace.
///
/// Models often continue prose after the JSON argument block; everything
/// past the final `}` is noise.
pub fn trim_to_last_brace(raw: &str) -> &str {
    match raw.rfind('}') {
        Some(idx) => &raw[..=idx],
        None => raw,
    }
}

/// Unwrap a whole call mistakenly embedded in the tool name field.
///
/// Some models emit the entire `{"tool_name": ..., "parameters": ...}`
/// object as the action name. When the name parses as such an object, the
/// real name and parameters are lifted out; otherwise the pair is returned
/// unchanged.
pub fn unwrap_embedded_call(tool_name: &str, parameters: Value) -> (String, Value) {
    let trimmed = tool_name.trim();
    if !trimmed.starts_with('{') {
        return (tool_name.to_string(), parameters);
    }

    let parsed: Value = match serde_json::from_str(trimmed) {
        Ok(v) => v,
        Err(_) => return (tool_name.to_string(), parameters),
    };

    let inner_name = parsed
        .get("tool_name")
        .or_else(|| parsed.get("tool"))
        .or_else(|| parsed.get("name"))
        .and_then(Value::as_str);

    match inner_name {
        Some(name) => {
            let inner_params = parsed
                .get("parameters")
                .or_else(|| parsed.get("arguments"))
                .cloned()
                .unwrap_or(parameters);
            (name.to_string(), inner_params)
        }
        None => (tool_name.to_string(), parameters),
    }
}

/// Strip a ```json ... ``` (or bare ```) fence, returning the inner text.
fn strip_code_fence(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_ticks = &text[start + 3..];
    // Skip an optional language tag ending at the first newline
    let body_start = after_ticks.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_ticks[body_start..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}

/// Find the first balanced `{...}` block, respecting strings and escapes.
fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Last resort: pull out quoted `"key": value` pairs individually.
fn scavenge_pairs(text: &str) -> Map<String, Value> {
    // regex-lite has no lazy compile cache; this path is rare enough that
    // compiling per call is fine
    let re = Regex::new(
        r#""([A-Za-z_][A-Za-z0-9_]*)"\s*:\s*("(?:[^"\\]|\\.)*"|-?\d+(?:\.\d+)?|true|false|null)"#,
    )
    .ok();

    let mut map = Map::new();
    if let Some(re) = re {
        for caps in re.captures_iter(text) {
            let (Some(key), Some(raw_value)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            if let Ok(value) = serde_json::from_str::<Value>(raw_value.as_str()) {
                map.insert(key.as_str().to_string(), value);
            }
        }
    }
    map
}
