//! Recovery of a JSON object from raw model output.
//!
//! Model text arrives in three common shapes: a bare JSON object, an object
//! inside a ```json fence, or an object embedded in prose. Extraction never
//! fails; every unrecoverable input resolves to an empty mapping so the
//! pipeline can branch to its fallback rules.

use serde_json::{Map, Value};

/// Extract a JSON object mapping from raw model text.
///
/// Fence extraction runs before any brace scanning: a model may wrap JSON in
/// prose and fencing at the same time, and scanning the un-fenced prose
/// first would pick up the wrong braces.
pub fn extract_json(text: &str) -> Map<String, Value> {
    let text = text.trim();
    if text.is_empty() {
        return Map::new();
    }

    let candidate = fenced_block(text).unwrap_or(text);

    if let Some(mapping) = parse_object(candidate) {
        return mapping;
    }

    scan_first_object(candidate).unwrap_or_default()
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::Object(mapping)) => Some(mapping),
        _ => None,
    }
}

/// Content of the first ```json fenced block, if any.
fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```json")?;
    let body = &text[start + "```json".len()..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}

/// Scan for the first syntactically complete top-level JSON object.
///
/// Tracks string literals and escapes so braces inside values do not skew
/// the balance. Candidates that balance but fail to parse are skipped and
/// the scan resumes at the next opening brace.
fn scan_first_object(text: &str) -> Option<Map<String, Value>> {
    let bytes = text.as_bytes();
    let mut search_from = 0;

    while let Some(offset) = text[search_from..].find('{') {
        let open = search_from + offset;
        if let Some(close) = matching_brace(bytes, open) {
            if let Some(mapping) = parse_object(&text[open..=close]) {
                return Some(mapping);
            }
        }
        search_from = open + 1;
    }

    None
}

fn matching_brace(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (index, &byte) in bytes.iter().enumerate().skip(open) {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }

    None
}
