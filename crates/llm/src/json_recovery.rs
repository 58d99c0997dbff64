//! Best-effort extraction of the first complete JSON object or array from a
//! text blob.
//!
//! Models asked for `json_object` output routinely wrap the JSON in prose
//! ("sure, here is the data: {...}"). This recovers the embedded value when
//! it can, and leaves the text alone when it cannot.

use serde_json::Value;

/// Tries to pull one complete JSON value out of `text`.
///
/// The scan counts matching open/close characters without string or escape
/// awareness: braces inside string literals confuse it. That is a known
/// trade-off of keeping the scan trivial, pinned by a test below.
pub(crate) fn recover_json(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let wrapped = (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'));
    if wrapped && let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    let start = match (trimmed.find('{'), trimmed.find('[')) {
        (Some(object), Some(array)) => object.min(array),
        (Some(object), None) => object,
        (None, Some(array)) => array,
        (None, None) => return None,
    };

    let bytes = trimmed.as_bytes();
    let (open, close) = if bytes[start] == b'{' { (b'{', b'}') } else { (b'[', b']') };

    let mut depth = 0usize;
    for (offset, byte) in bytes[start..].iter().enumerate() {
        if *byte == open {
            depth += 1;
        } else if *byte == close {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                let candidate = &trimmed[start..=start + offset];
                return serde_json::from_str(candidate).ok();
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::recover_json;

    #[test]
    fn whole_text_is_valid_json() {
        assert_eq!(recover_json(r#"  {"a": 1} "#), Some(json!({"a": 1})));
        assert_eq!(recover_json("[1, 2, 3]"), Some(json!([1, 2, 3])));
    }

    #[test]
    fn embedded_object_is_recovered() {
        let recovered = recover_json(r#"sure, here: {"a":1} trailing"#);
        assert_eq!(recovered, Some(json!({"a": 1})));
    }

    #[test]
    fn nested_structures_balance() {
        let recovered = recover_json(r#"data: {"a": {"b": [1, {"c": 2}]}} done"#);
        assert_eq!(recovered, Some(json!({"a": {"b": [1, {"c": 2}]}})));
    }

    #[test]
    fn earlier_opener_wins() {
        let recovered = recover_json(r#"list [1,2] then {"a":1}"#);
        assert_eq!(recovered, Some(json!([1, 2])));
    }

    #[test]
    fn no_opener_returns_none() {
        assert_eq!(recover_json("plain prose without structure"), None);
        assert_eq!(recover_json(""), None);
    }

    #[test]
    fn unbalanced_braces_return_none() {
        assert_eq!(recover_json(r#"broken {"a": 1"#), None);
    }

    #[test]
    fn braces_inside_string_literals_confuse_the_scan() {
        // The scan is deliberately not string-aware: the closing brace
        // inside the literal ends the candidate slice early, the slice does
        // not parse, and recovery yields nothing.
        assert_eq!(recover_json(r#"prefix {"a": "}"} suffix"#), None);

        // Without a prefix, the direct-parse fast path still succeeds.
        assert_eq!(recover_json(r#"{"a": "}"}"#), Some(json!({"a": "}"})));
    }
}
