//! Shared data model: JSON values, columns, rows, and table identifiers.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Generic runtime value covering the JSON value kinds.
///
/// Cell values and all request/response bodies are expressed as this closed
/// variant rather than an untyped blob, which makes equality and round-trip
/// testing precise. Serializes to plain JSON (`#[serde(untagged)]`).
///
/// Objects use `BTreeMap` for deterministic serialization order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// JSON null.
    Null,
    /// JSON boolean.
    Bool(bool),
    /// JSON integer (signed 64-bit).
    Int(i64),
    /// JSON floating-point (64-bit IEEE 754).
    Float(f64),
    /// JSON string (UTF-8).
    String(String),
    /// JSON array (ordered sequence of values).
    Array(Vec<Value>),
    /// JSON object (ordered map of string keys to values).
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// Returns the value under `key` if this is an object.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(map) => map.get(key),
            _ => None,
        }
    }

    /// Returns the string content if this is a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Converts a `serde_json::Value` into the closed variant.
    ///
    /// Numbers become `Int` when they fit in `i64`, `Float` otherwise.
    #[must_use]
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Converts into a `serde_json::Value`.
    ///
    /// Non-finite floats have no JSON representation and collapse to null.
    #[must_use]
    pub fn into_json(self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Int(i) => serde_json::Value::Number(i.into()),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::String(s) => serde_json::Value::String(s),
            Value::Array(items) => {
                serde_json::Value::Array(items.into_iter().map(Value::into_json).collect())
            }
            Value::Object(map) => serde_json::Value::Object(
                map.into_iter().map(|(k, v)| (k, v.into_json())).collect(),
            ),
        }
    }
}

/// A schema entry with a stable, table-assigned integer id.
///
/// All caller-supplied attributes (e.g. `name`) ride along untouched via
/// `#[serde(flatten)]`; the store only interprets `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Assigned by the table store, strictly increasing, never reused.
    pub id: u64,
    #[serde(flatten)]
    pub attrs: BTreeMap<String, Value>,
}

/// One cell value in a materialized row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowValue {
    /// Column id this value belongs to.
    pub id: u64,
    /// The stored cell value.
    pub value: Value,
}

/// A virtual row, reconstructed at read time from scattered cell entries.
///
/// Never persisted as an entity; a row exists iff at least one cell
/// references its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Caller-supplied row id (free-form string).
    pub id: String,
    /// Cell values in cell scan order.
    pub values: Vec<RowValue>,
}

/// Error from parsing a table id string.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TableIdError {
    #[error("table id must be 32 characters, got {0}")]
    Length(usize),
    #[error("table id must be lowercase hex")]
    Charset,
}

/// Opaque, globally unique table identifier (32 lowercase hex characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableId(String);

impl TableId {
    /// Parses and validates a table id string.
    ///
    /// # Errors
    ///
    /// Returns [`TableIdError`] if the string is not 32 lowercase hex chars.
    pub fn parse(s: &str) -> Result<Self, TableIdError> {
        if s.len() != 32 {
            return Err(TableIdError::Length(s.len()));
        }
        if !s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)) {
            return Err(TableIdError::Charset);
        }
        Ok(Self(s.to_string()))
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
