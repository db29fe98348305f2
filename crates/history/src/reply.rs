//! Decode the JSON objects the summarizer replies with.

use std::borrow::Cow;

use memoir_domain::error::{Error, Result};
use memoir_domain::message::MessageContent;
use serde::Deserialize;
use serde_json::{Map, Value};

pub const SUMMARY_KEY: &str = "对话摘要";
pub const REVIEW_EXPLANATION_KEY: &str = "修正说明";
pub const REVIEW_MESSAGES_KEY: &str = "修正后的对话";

/// Both fields are required; a reply missing either is malformed.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewReply {
    #[serde(rename = "修正说明")]
    pub explanation: String,
    #[serde(rename = "修正后的对话")]
    pub messages: Vec<ReviewedTurn>,
}

/// A turn as returned by review; `role` is a free-form speaker label.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewedTurn {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: MessageContent,
}

/// Remove markdown code-fence markers. Only replies that open with a fence
/// are touched; every `` ```json `` and `` ``` `` marker is then dropped.
pub fn strip_code_fence(raw: &str) -> Cow<'_, str> {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return Cow::Borrowed(trimmed);
    }
    let stripped = trimmed.replace("```json", "").replace("```", "");
    Cow::Owned(stripped.trim().to_owned())
}

/// Parse a reply that must be a JSON object.
fn parse_object(raw: &str, what: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str(&strip_code_fence(raw)) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(Error::MalformedOutput(format!(
            "{what} reply is not a JSON object: {other}"
        ))),
        Err(e) => Err(Error::MalformedOutput(format!("{what} reply: {e}"))),
    }
}

/// Extract the summary text. Non-string values are kept as their JSON text.
pub fn decode_summary(raw: &str) -> Result<String> {
    let mut reply = parse_object(raw, "summary")?;
    match reply.remove(SUMMARY_KEY) {
        None | Some(Value::Null) => Err(Error::MalformedOutput(format!(
            "summary reply has no \"{SUMMARY_KEY}\" field"
        ))),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Ok(other.to_string()),
    }
}

pub fn decode_review(raw: &str) -> Result<ReviewReply> {
    let reply = parse_object(raw, "review")?;
    serde_json::from_value(Value::Object(reply)).map_err(|e| {
        Error::MalformedOutput(format!(
            "review reply (expects \"{REVIEW_EXPLANATION_KEY}\" and \"{REVIEW_MESSAGES_KEY}\"): {e}"
        ))
    })
}
