use serde::{Deserialize, Serialize};

/// One conversation turn as it is stored in an identity's history.
///
/// Messages are values: compaction and review build new ones rather than
/// editing stored turns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(alias = "human")]
    User,
    #[serde(alias = "ai")]
    Assistant,
    System,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Text(String::new())
    }
}

/// A single entry of structured content.
///
/// Only strict `{"type": "text", "text": ...}` objects are interpreted;
/// everything else (image and audio references, provider-specific blocks)
/// is carried through untouched so the durable log never loses it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentPart {
    Text(TextPart),
    Bare(String),
    Opaque(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextPart {
    #[serde(rename = "type")]
    kind: TextKind,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
enum TextKind {
    #[default]
    #[serde(rename = "text")]
    Text,
}

// ── Convenience constructors ───────────────────────────────────────

impl Message {
    pub fn new(role: Role, content: MessageContent) -> Self {
        Self { role, content }
    }
    pub fn system(text: impl Into<String>) -> Self {
        Self { role: Role::System, content: MessageContent::Text(text.into()) }
    }
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, content: MessageContent::Text(text.into()) }
    }
    pub fn assistant(text: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: MessageContent::Text(text.into()) }
    }
    pub fn with_parts(role: Role, parts: Vec<ContentPart>) -> Self {
        Self { role, content: MessageContent::Parts(parts) }
    }
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text(TextPart {
            kind: TextKind::Text,
            text: text.into(),
        })
    }

    /// Text for prompt building. Parts without extractable text render as
    /// `|<type>|`.
    pub fn flatten(&self) -> String {
        match self {
            ContentPart::Text(part) => part.text.clone(),
            ContentPart::Bare(s) => s.clone(),
            ContentPart::Opaque(serde_json::Value::Object(map)) => {
                match map.get("text").and_then(|v| v.as_str()) {
                    Some(text) => text.to_owned(),
                    None => {
                        let kind = map.get("type").and_then(|v| v.as_str()).unwrap_or("");
                        format!("|{kind}|")
                    }
                }
            }
            ContentPart::Opaque(other) => other.to_string(),
        }
    }
}

impl MessageContent {
    /// Flatten to a single string, joining parts with newlines.
    pub fn flatten(&self) -> String {
        match self {
            MessageContent::Text(t) => t.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .map(ContentPart::flatten)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// The plain-text body, if this content is a single string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(t) => Some(t.as_str()),
            MessageContent::Parts(_) => None,
        }
    }
}
