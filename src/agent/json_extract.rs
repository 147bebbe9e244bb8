//! Extracts the first balanced `{...}` JSON object from free-form LLM
//! output, tolerating prose before/after the object. Grounded in
//! `original_source/tinytroupe/utils.py`'s `extract_json` helper.

use serde_json::Value;

pub fn extract_json(content: &str) -> Option<Value> {
    let start = content.find('{')?;
    let bytes = content.as_bytes();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, &byte) in bytes[start..].iter().enumerate() {
        let ch = byte as char;
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + 1;
                    return serde_json::from_str(&content[start..end]).ok();
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

    #[test]
    fn extracts_object_with_surrounding_prose() {
        let content = "Sure, here is my answer:\n{\"action\": {\"type\": \"DONE\"}}\nThanks!";
        let value = extract_json(content).unwrap();
        assert_eq!(value["action"]["type"], "DONE");
    }

    #[test]
    fn handles_nested_braces_and_string_escapes() {
        let content = r#"{"action": {"type": "TALK", "content": "he said \"hi {there}\""}}"#;
        let value = extract_json(content).unwrap();
        assert_eq!(value["action"]["content"], "he said \"hi {there}\"");
    }

    #[test]
    fn returns_none_without_braces() {
        assert!(extract_json("no json here").is_none());
    }
}
