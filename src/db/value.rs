// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Field-tagged document representation used by the document store's REST API.
//!
//! Every field is wrapped in a single-key object naming its type:
//! `{"title": {"stringValue": "Hello"}, "views": {"integerValue": "3"}}`.
//!
//! Writing is strict (records always produce the exact tagged shape). Reading
//! is lenient: the `read_*` helpers default on a missing or mistyped field
//! because the remote schema is not enforced server-side.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// A document's field bag.
pub type Fields = BTreeMap<String, Value>;

/// A single typed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    /// int64 travels as a decimal string
    IntegerValue(#[serde(deserialize_with = "string_or_number")] String),
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(serde_json::Value),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: Fields,
}

/// A stored document as returned by reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name; the last path segment is the document id.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fields: Fields,
}

impl Document {
    pub fn new(name: impl Into<String>, fields: Fields) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// The document id (last segment of the resource name), if any.
    pub fn id(&self) -> Option<&str> {
        self.name.rsplit('/').next().filter(|id| !id.is_empty())
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(f) => f.to_string(),
    })
}

// ─── Writing ─────────────────────────────────────────────────

impl Value {
    pub fn string(value: impl Into<String>) -> Self {
        Value::StringValue(value.into())
    }

    pub fn integer(value: i64) -> Self {
        Value::IntegerValue(value.to_string())
    }

    pub fn boolean(value: bool) -> Self {
        Value::BooleanValue(value)
    }

    pub fn string_array<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::ArrayValue(ArrayValue {
            values: values.into_iter().map(Value::string).collect(),
        })
    }

    pub fn array(values: Vec<Value>) -> Self {
        Value::ArrayValue(ArrayValue { values })
    }

    pub fn map(fields: Fields) -> Self {
        Value::MapValue(MapValue { fields })
    }

    /// Optional strings are written as `nullValue` when absent.
    pub fn optional_string(value: Option<&str>) -> Self {
        match value {
            Some(v) => Value::string(v),
            None => Value::NullValue(()),
        }
    }
}

/// Small builder so record encoders read as a list of fields.
#[derive(Debug, Default)]
pub struct FieldsBuilder {
    fields: Fields,
}

impl FieldsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn string(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields.insert(key.to_string(), Value::string(value));
        self
    }

    pub fn integer(mut self, key: &str, value: i64) -> Self {
        self.fields.insert(key.to_string(), Value::integer(value));
        self
    }

    pub fn boolean(mut self, key: &str, value: bool) -> Self {
        self.fields.insert(key.to_string(), Value::boolean(value));
        self
    }

    pub fn optional_string(mut self, key: &str, value: Option<&str>) -> Self {
        self.fields
            .insert(key.to_string(), Value::optional_string(value));
        self
    }

    pub fn string_array<I, S>(mut self, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields
            .insert(key.to_string(), Value::string_array(values));
        self
    }

    pub fn value(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    pub fn build(self) -> Fields {
        self.fields
    }
}

// ─── Reading ─────────────────────────────────────────────────

/// Parse an integer leniently: strings, doubles and booleans are accepted,
/// anything else is 0.
pub fn parse_int(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::IntegerValue(s)) | Some(Value::StringValue(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
                .unwrap_or(0)
        }
        Some(Value::DoubleValue(f)) if f.is_finite() => *f as i64,
        Some(Value::BooleanValue(b)) => i64::from(*b),
        _ => 0,
    }
}

pub fn read_int(fields: &Fields, key: &str) -> i64 {
    parse_int(fields.get(key))
}

/// Non-negative counter; negative stored values read as 0.
pub fn read_count(fields: &Fields, key: &str) -> u32 {
    u32::try_from(read_int(fields, key).max(0)).unwrap_or(u32::MAX)
}

pub fn read_bool(fields: &Fields, key: &str) -> bool {
    match fields.get(key) {
        Some(Value::BooleanValue(b)) => *b,
        Some(Value::StringValue(s)) => s.eq_ignore_ascii_case("true"),
        Some(Value::IntegerValue(_)) => parse_int(fields.get(key)) != 0,
        _ => false,
    }
}

pub fn read_string(fields: &Fields, key: &str) -> String {
    read_optional_string(fields, key).unwrap_or_default()
}

pub fn read_optional_string(fields: &Fields, key: &str) -> Option<String> {
    match fields.get(key) {
        Some(Value::StringValue(s)) | Some(Value::TimestampValue(s)) => Some(s.clone()),
        Some(Value::IntegerValue(s)) => Some(s.clone()),
        Some(Value::BooleanValue(b)) => Some(b.to_string()),
        Some(Value::DoubleValue(f)) => Some(f.to_string()),
        _ => None,
    }
}

pub fn read_array<'a>(fields: &'a Fields, key: &str) -> &'a [Value] {
    match fields.get(key) {
        Some(Value::ArrayValue(array)) => &array.values,
        _ => &[],
    }
}

pub fn read_string_list(fields: &Fields, key: &str) -> Vec<String> {
    read_array(fields, key)
        .iter()
        .filter_map(|v| match v {
            Value::StringValue(s) => Some(s.clone()),
            Value::IntegerValue(s) => Some(s.clone()),
            _ => None,
        })
        .collect()
}

/// Nested map fields; anything that is not a map reads as empty.
pub fn read_map<'a>(fields: &'a Fields, key: &str) -> Option<&'a Fields> {
    match fields.get(key) {
        Some(Value::MapValue(map)) => Some(&map.fields),
        _ => None,
    }
}

/// Map entries of an array field (non-map entries are skipped).
pub fn read_map_list<'a>(fields: &'a Fields, key: &str) -> Vec<&'a Fields> {
    read_array(fields, key)
        .iter()
        .filter_map(|v| match v {
            Value::MapValue(map) => Some(&map.fields),
            _ => None,
        })
        .collect()
}
