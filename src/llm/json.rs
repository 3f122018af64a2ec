//! JSON reading for model responses.
//!
//! Models asked for a structured value sometimes wrap it in a markdown code
//! fence. The document itself is tried first; a single fenced block is the
//! only other place a value is taken from.

use serde_json::Value;

/// Parse `text` as a JSON document, falling back to the contents of a code fence.
pub fn parse_json_document(text: &str) -> Option<Value> {
    let trimmed = text.trim();

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    let inner = unwrap_code_fence(trimmed)?;
    serde_json::from_str::<Value>(inner).ok()
}

/// Return the body of the first ` ```json ` or bare ` ``` ` fenced block.
pub fn unwrap_code_fence(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_ticks = &text[start + 3..];

    // Skip an info string such as `json` up to the end of the opening line
    let body_start = match after_ticks.find('\n') {
        Some(newline) if is_info_string(&after_ticks[..newline]) => newline + 1,
        _ if after_ticks.starts_with("json") => 4,
        _ => 0,
    };
    let body = &after_ticks[body_start..];

    let end = body.find("```")?;
    Some(body[..end].trim())
}

fn is_info_string(line: &str) -> bool {
    line.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
