use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Runtime category of a JSON value, named the way `jsonb_typeof` reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonValueKind {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
}

impl JsonValueKind {
    pub const ALL: [JsonValueKind; 6] = [
        JsonValueKind::Object,
        JsonValueKind::Array,
        JsonValueKind::String,
        JsonValueKind::Number,
        JsonValueKind::Boolean,
        JsonValueKind::Null,
    ];

    pub fn of(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => JsonValueKind::Null,
            serde_json::Value::Bool(_) => JsonValueKind::Boolean,
            serde_json::Value::Number(_) => JsonValueKind::Number,
            serde_json::Value::String(_) => JsonValueKind::String,
            serde_json::Value::Array(_) => JsonValueKind::Array,
            serde_json::Value::Object(_) => JsonValueKind::Object,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JsonValueKind::Null => "null",
            JsonValueKind::Boolean => "boolean",
            JsonValueKind::Number => "number",
            JsonValueKind::String => "string",
            JsonValueKind::Array => "array",
            JsonValueKind::Object => "object",
        }
    }
}

impl Display for JsonValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for JsonValueKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> { JsonValueKind::ALL.into_iter().find(|kind| kind.as_str() == s).ok_or(()) }
}
