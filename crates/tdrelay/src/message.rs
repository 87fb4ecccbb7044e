//! Dynamically typed messages exchanged with the native client.
//!
//! Every message is a JSON object. Two keys are reserved: `@type` names the
//! message kind and `@extra` carries the correlation tag the engine injects
//! into outgoing requests. All other keys belong to the protocol and are
//! carried through untouched.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::CodecError;

/// Key holding the message kind.
pub const TYPE_KEY: &str = "@type";

/// Key holding the correlation tag.
pub const EXTRA_KEY: &str = "@extra";

/// Kind of the replies the library sends when a request fails.
pub const ERROR_TYPE: &str = "error";

/// A JSON object with optional `@type` and `@extra` entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Message(Map<String, Value>);

impl Message {
    /// Creates a message of the given kind with no other fields.
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert(TYPE_KEY.to_owned(), Value::String(type_name.into()));
        Self(fields)
    }

    /// Creates a message with no fields at all.
    #[must_use]
    pub fn empty() -> Self {
        Self(Map::new())
    }

    /// Adds a field and returns the message, for building requests inline.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// The `@type` discriminator, if present as a non-empty string.
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        non_empty_str(self.0.get(TYPE_KEY))
    }

    /// The `@extra` correlation tag, if present as a non-empty string.
    #[must_use]
    pub fn extra(&self) -> Option<&str> {
        non_empty_str(self.0.get(EXTRA_KEY))
    }

    /// Replaces the correlation tag.
    pub fn set_extra(&mut self, tag: impl Into<String>) {
        self.0.insert(EXTRA_KEY.to_owned(), Value::String(tag.into()));
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Inserts a field, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Removes a field, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Whether the message has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Consumes the message, returning the underlying JSON object.
    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    /// Code and text of an `error` reply.
    #[must_use]
    pub fn error_details(&self) -> Option<(i64, &str)> {
        if self.type_name() != Some(ERROR_TYPE) {
            return None;
        }
        let code = self.0.get("code").and_then(Value::as_i64).unwrap_or_default();
        let message = self.0.get("message").and_then(Value::as_str).unwrap_or_default();
        Some((code, message))
    }

    /// Serialises the message to UTF-8 JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encode`] if serialisation fails.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(&self.0).map_err(CodecError::Encode)
    }

    /// Parses wire bytes.
    ///
    /// Empty or whitespace-only input yields an empty message, which callers
    /// treat as "nothing to route".
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Malformed`] for invalid JSON or UTF-8 and
    /// [`CodecError::NotAnObject`] when the document is not an object.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::empty());
        }
        let value: Value = serde_json::from_slice(bytes).map_err(CodecError::Malformed)?;
        Self::try_from(value)
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|text| !text.is_empty())
}

const fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl From<Map<String, Value>> for Message {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl TryFrom<Value> for Message {
    type Error = CodecError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(CodecError::NotAnObject {
                found: value_kind(&other),
            }),
        }
    }
}

impl From<Message> for Value {
    fn from(message: Message) -> Self {
        Self::Object(message.0)
    }
}

impl FromStr for Message {
    type Err = CodecError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::decode(input.as_bytes())
    }
}

impl fmt::Display for Message {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(&self.0).map_err(|_| fmt::Error)?;
        formatter.write_str(&text)
    }
}
