//! Balanced-JSON extraction from oracle free text
//!
//! The text-generation oracle is asked to return bare JSON but routinely
//! wraps it in prose or code fences. This module pulls the first balanced
//! array or object out of such text. Failure semantics are "not found",
//! never an error: callers degrade to their stage fallback.

use serde_json::Value;

/// Extract the first balanced JSON array from free text.
pub fn extract_json_array(text: &str) -> Option<Value> {
    extract_first(text, '[', ']')
}

/// Extract the first balanced JSON object from free text.
pub fn extract_json_object(text: &str) -> Option<Value> {
    extract_first(text, '{', '}')
}

/// Scan for `open`, walk to its balanced `close` (string- and
/// escape-aware), and return the first span that parses as JSON.
fn extract_first(text: &str, open: char, close: char) -> Option<Value> {
    let chars: Vec<char> = text.chars().collect();
    let mut start = 0;

    while let Some(offset) = chars[start..].iter().position(|&c| c == open) {
        let begin = start + offset;
        if let Some(end) = balanced_end(&chars[begin..], open, close) {
            let candidate: String = chars[begin..begin + end + 1].iter().collect();
            if let Ok(value) = serde_json::from_str::<Value>(&candidate) {
                return Some(value);
            }
        }
        start = begin + 1;
    }

    None
}

/// Index of the character closing the span opened at `chars[0]`.
fn balanced_end(chars: &[char], open: char, close: char) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_array_is_extracted() {
        assert_eq!(extract_json_array("[0, 3, 7]"), Some(json!([0, 3, 7])));
    }

    #[test]
    fn prose_wrapped_array_is_extracted() {
        let text = "Here are the selected indices:\n```json\n[1, 4]\n```\nHope that helps!";
        assert_eq!(extract_json_array(text), Some(json!([1, 4])));
    }

    #[test]
    fn nested_arrays_stay_balanced() {
        let text = "result: [[1, 2], [3]] trailing [9]";
        assert_eq!(extract_json_array(text), Some(json!([[1, 2], [3]])));
    }

    #[test]
    fn brackets_inside_strings_are_ignored() {
        let text = r#"[{"title": "On [redacted] systems", "score": 90}]"#;
        let value = extract_json_array(text).unwrap();
        assert_eq!(value[0]["score"], 90);
    }

    #[test]
    fn unbalanced_text_yields_none() {
        assert_eq!(extract_json_array("no json here"), None);
        assert_eq!(extract_json_array("[1, 2"), None);
        assert_eq!(extract_json_object("{\"open\": true"), None);
    }

    #[test]
    fn malformed_span_falls_through_to_next_candidate() {
        let text = "[not json] then [2, 3]";
        assert_eq!(extract_json_array(text), Some(json!([2, 3])));
    }

    #[test]
    fn object_extraction_works() {
        let text = "metrics are {\"h_index\": 12, \"total_citations\": 3400} as scraped";
        let value = extract_json_object(text).unwrap();
        assert_eq!(value["h_index"], 12);
    }
}
