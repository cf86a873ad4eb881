use serde_json::Value;

/// A JSON object located inside free-form model output, plus the prose around it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPayload {
    pub value: Value,
    /// Text before and after the braces, trimmed and joined with a blank line.
    pub prose: String,
}

/// Locate the span from the first `{` to the last `}` and parse it as JSON.
///
/// Returns `None` when there is no such span or the span does not parse;
/// the caller treats that turn as conversational guidance.
pub fn extract_json_payload(text: &str) -> Option<ExtractedPayload> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }

    let candidate = &text[start..=end];
    let value: Value = match serde_json::from_str(candidate) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(error = %e, "Model output contained braces but no parseable JSON");
            return None;
        }
    };

    let before = text[..start].trim();
    let after = text[end + 1..].trim();
    let prose = match (before.is_empty(), after.is_empty()) {
        (true, true) => String::new(),
        (false, true) => before.to_string(),
        (true, false) => after.to_string(),
        (false, false) => format!("{before}\n\n{after}"),
    };

    Some(ExtractedPayload { value, prose })
}
