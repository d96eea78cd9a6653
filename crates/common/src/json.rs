//! Best-effort recovery of JSON objects from model output.
//!
//! Completion services occasionally wrap the requested JSON in prose or code
//! fences. Callers take the first balanced `{...}` span and try to parse it;
//! a miss is never an error, the caller keeps the raw text instead.

use serde::de::DeserializeOwned;

/// Extract the first balanced JSON object from a string that may contain other text.
///
/// Braces inside string literals are ignored when balancing.
pub fn extract_json_object(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Extract and deserialize the first JSON object in `s`.
pub fn parse_json_object<T: DeserializeOwned>(s: &str) -> Option<T> {
    let json_str = extract_json_object(s)?;
    serde_json::from_str(json_str).ok()
}
