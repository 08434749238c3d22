//! JSON-or-text payload decoding.

use serde_json::Value;

/// A frame payload after the decode attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// The payload was valid JSON.
    Structured(Value),
    /// The payload was not JSON; the raw text is kept unchanged.
    Opaque(String),
}

impl Payload {
    /// Decodes `raw` as JSON, falling back to [`Payload::Opaque`].
    pub fn decode(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self::Structured(value),
            Err(_) => Self::Opaque(raw.to_string()),
        }
    }

    pub fn as_object(&self) -> Option<&serde_json::Map<String, Value>> {
        match self {
            Self::Structured(value) => value.as_object(),
            Self::Opaque(_) => None,
        }
    }

    /// Looks up a top-level field of an object payload.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.as_object().and_then(|object| object.get(name))
    }

    /// The payload as text: JSON strings unwrap to their content, other
    /// JSON values serialize compactly, opaque text is returned as-is.
    pub fn as_text(&self) -> String {
        match self {
            Self::Structured(Value::String(text)) => text.clone(),
            Self::Structured(value) => value.to_string(),
            Self::Opaque(text) => text.clone(),
        }
    }

    /// Human-readable rendering used by the default handler.
    pub fn pretty(&self) -> String {
        match self {
            Self::Structured(Value::String(text)) => text.clone(),
            Self::Structured(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            Self::Opaque(text) => text.clone(),
        }
    }
}

/// Renders a JSON scalar without quotes; other values serialize compactly.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
