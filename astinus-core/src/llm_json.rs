//! Extracting a JSON object from raw LLM text output.
//!
//! LLMs routinely wrap JSON in markdown fences or surround it with
//! conversational text. `extract_json` strips fences first, then performs a
//! real balanced-brace scan for the first top-level `{...}` substring,
//! tracking string/escape state so braces inside string literals don't
//! confuse the scan.

/// Find the first top-level `{...}` object in `text`, after stripping any
/// surrounding ```json fence. Returns `None` if no balanced object exists.
pub fn extract_json(text: &str) -> Option<&str> {
    let text = strip_fence(text.trim());
    let bytes = text.as_bytes();
    let start = bytes.iter().position(|&b| b == b'{')?;

    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

fn strip_fence(text: &str) -> &str {
    if let Some(start) = text.find("```json") {
        let content_start = start + "```json".len();
        if let Some(end) = text[content_start..].find("```") {
            return text[content_start..content_start + end].trim();
        }
    }
    if let Some(start) = text.find("```") {
        let content_start = start + 3;
        if let Some(end) = text[content_start..].find("```") {
            return text[content_start..content_start + end].trim();
        }
    }
    text
}

/// Extract and deserialize the first top-level JSON object in `text` as `T`.
pub fn extract_json_as<T: serde::de::DeserializeOwned>(text: &str) -> Result<T, ExtractJsonError> {
    let json = extract_json(text).ok_or(ExtractJsonError::NoObjectFound)?;
    serde_json::from_str(json).map_err(ExtractJsonError::Invalid)
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractJsonError {
    #[error("no top-level JSON object found in LLM output")]
    NoObjectFound,
    #[error("found a JSON-like object but it did not deserialize: {0}")]
    Invalid(#[source] serde_json::Error),
}
