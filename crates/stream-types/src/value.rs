//! Dynamically typed scalar values carried alongside the envelope.
//!
//! [`ExtraFields`] is a [`BTreeMap`] so that its JSON encoding always lists
//! keys in sorted order. The event ID hashes that encoding, which keeps the
//! ID stable no matter the order fields were inserted in.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Keys owned by the envelope. They can never appear in [`ExtraFields`].
pub const RESERVED_KEYS: [&str; 3] = ["id", "type", "time"];

/// Whether `key` is one of the [`RESERVED_KEYS`].
pub fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// A scalar field value.
///
/// Encoded untagged, so `{"count": 3, "user": "bob"}` decodes to one
/// `Integer` and one `Text`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// A signed 64-bit integer.
    Integer(i64),
    /// A UTF-8 string.
    Text(String),
}

/// Field name to value mapping for the non-envelope part of an event.
pub type ExtraFields = BTreeMap<String, FieldValue>;

impl FieldValue {
    /// Convert a decoded JSON value, returning `None` for anything that is
    /// not an `i64`-representable integer or a string.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_i64().map(Self::Integer),
            serde_json::Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    /// Return the integer, if this is an `Integer`.
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    /// Return the string, if this is a `Text`.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Integer(_) => None,
        }
    }
}

impl From<&FieldValue> for serde_json::Value {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Integer(n) => Self::from(*n),
            FieldValue::Text(s) => Self::String(s.clone()),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl core::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}
