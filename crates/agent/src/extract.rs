use sarpipe_core::ExtractionError;
use serde_json::{Map, Value};

const FENCE: &str = "```";
const JSON_FENCE: &str = "```json";

/// Where the candidate payload was found in the raw response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadSource<'a> {
    /// Body of the first ```` ```json ```` block.
    JsonFence(&'a str),
    /// Body of the first untagged ```` ``` ```` block.
    Fence(&'a str),
    /// No fence present; the whole response.
    Bare(&'a str),
}

impl<'a> PayloadSource<'a> {
    pub fn body(&self) -> &'a str {
        match self {
            Self::JsonFence(body) | Self::Fence(body) | Self::Bare(body) => body,
        }
    }
}

/// A ```` ```json ```` marker wins over any earlier plain fence. The body runs
/// to the next fence marker, or to the end of the text when unterminated.
pub fn locate_payload(text: &str) -> PayloadSource<'_> {
    if let Some(start) = text.find(JSON_FENCE) {
        return PayloadSource::JsonFence(until_next_fence(&text[start + JSON_FENCE.len()..]));
    }
    if let Some(start) = text.find(FENCE) {
        return PayloadSource::Fence(until_next_fence(&text[start + FENCE.len()..]));
    }
    PayloadSource::Bare(text)
}

fn until_next_fence(rest: &str) -> &str {
    match rest.find(FENCE) {
        Some(end) => &rest[..end],
        None => rest,
    }
}

/// Prose around unfenced JSON is not stripped: such text goes to the parser
/// whole and fails.
pub fn extract_payload(text: &str) -> Result<Map<String, Value>, ExtractionError> {
    let candidate = locate_payload(text).body().trim();
    if candidate.is_empty() {
        return Err(ExtractionError::Empty);
    }

    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ExtractionError::NotAnObject { found: json_kind(&other) }),
        Err(source) => Err(ExtractionError::Malformed { source }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
