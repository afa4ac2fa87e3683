//! Firestore's typed JSON value encoding.
//!
//! Every field in a REST document is an object with exactly one key naming
//! its type (`{"stringValue": "x"}`, `{"integerValue": "3"}`, ...). Integers
//! travel as decimal strings.

use std::collections::BTreeMap;

use chrono::SecondsFormat;
use pipeline::{StoreError, Timestamp};
use serde::{Deserialize, Serialize};

/// The `fields` object of a document or map value.
pub type Fields = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(#[serde(with = "integer_string")] i64),
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: Fields,
}

mod integer_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Number(i64),
        }
        match Repr::deserialize(deserializer)? {
            Repr::Text(text) => text.parse().map_err(de::Error::custom),
            Repr::Number(n) => Ok(n),
        }
    }
}

impl Value {
    pub fn string(value: impl Into<String>) -> Self {
        Value::StringValue(value.into())
    }

    pub fn opt_string(value: Option<impl Into<String>>) -> Self {
        value.map_or(Value::NullValue(()), Value::string)
    }

    pub fn timestamp(value: Timestamp) -> Self {
        Value::TimestampValue(
            value
                .as_datetime()
                .to_rfc3339_opts(SecondsFormat::Micros, true),
        )
    }

    pub fn opt_timestamp(value: Option<Timestamp>) -> Self {
        value.map_or(Value::NullValue(()), Value::timestamp)
    }

    pub fn map(fields: Fields) -> Self {
        Value::MapValue(MapValue { fields })
    }

    pub fn array(values: Vec<Value>) -> Self {
        Value::ArrayValue(ArrayValue { values })
    }

    /// Converts arbitrary JSON (content extras, metadata) into a value.
    /// Numbers that fit in `i64` become integers, the rest doubles.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::NullValue(()),
            serde_json::Value::Bool(b) => Value::BooleanValue(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::IntegerValue(i),
                None => Value::DoubleValue(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Value::string(s.as_str()),
            serde_json::Value::Array(items) => Value::array(items.iter().map(Value::from_json).collect()),
            serde_json::Value::Object(map) => Value::map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Inverse of [`Value::from_json`]. Timestamps, bytes and references come
    /// back as strings.
    pub fn into_json(self) -> serde_json::Value {
        match self {
            Value::NullValue(()) => serde_json::Value::Null,
            Value::BooleanValue(b) => b.into(),
            Value::IntegerValue(i) => i.into(),
            Value::DoubleValue(d) => serde_json::Number::from_f64(d)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::TimestampValue(s)
            | Value::StringValue(s)
            | Value::BytesValue(s)
            | Value::ReferenceValue(s) => s.into(),
            Value::ArrayValue(array) => {
                serde_json::Value::Array(array.values.into_iter().map(Value::into_json).collect())
            }
            Value::MapValue(map) => serde_json::Value::Object(
                map.fields
                    .into_iter()
                    .map(|(k, v)| (k, v.into_json()))
                    .collect(),
            ),
        }
    }

    fn is_null(&self) -> bool {
        matches!(self, Value::NullValue(()))
    }
}

/// Typed, error-reporting access to a document's fields.
pub struct FieldReader<'a> {
    fields: &'a Fields,
    document: &'a str,
}

impl<'a> FieldReader<'a> {
    pub fn new(fields: &'a Fields, document: &'a str) -> Self {
        Self { fields, document }
    }

    fn codec_error(&self, key: &str, expected: &str) -> StoreError {
        StoreError::Codec(format!("{}: field `{key}` is not {expected}", self.document))
    }

    /// The field, treating an explicit null like a missing key.
    fn get(&self, key: &str) -> Option<&'a Value> {
        self.fields.get(key).filter(|v| !v.is_null())
    }

    pub fn string(&self, key: &str) -> Result<String, StoreError> {
        self.opt_string(key)?
            .ok_or_else(|| self.codec_error(key, "a string"))
    }

    pub fn opt_string(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::StringValue(s)) => Ok(Some(s.clone())),
            Some(_) => Err(self.codec_error(key, "a string")),
        }
    }

    pub fn opt_integer(&self, key: &str) -> Result<Option<i64>, StoreError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::IntegerValue(i)) => Ok(Some(*i)),
            Some(_) => Err(self.codec_error(key, "an integer")),
        }
    }

    pub fn bool_or_false(&self, key: &str) -> Result<bool, StoreError> {
        match self.get(key) {
            None => Ok(false),
            Some(Value::BooleanValue(b)) => Ok(*b),
            Some(_) => Err(self.codec_error(key, "a boolean")),
        }
    }

    pub fn timestamp(&self, key: &str) -> Result<Timestamp, StoreError> {
        self.opt_timestamp(key)?
            .ok_or_else(|| self.codec_error(key, "a timestamp"))
    }

    /// Accepts `timestampValue` and RFC 3339 `stringValue` (older documents
    /// written without a native timestamp).
    pub fn opt_timestamp(&self, key: &str) -> Result<Option<Timestamp>, StoreError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::TimestampValue(s)) | Some(Value::StringValue(s)) => Timestamp::parse_rfc3339(s)
                .map(Some)
                .ok_or_else(|| self.codec_error(key, "a timestamp")),
            Some(_) => Err(self.codec_error(key, "a timestamp")),
        }
    }

    pub fn string_list(&self, key: &str) -> Result<Vec<String>, StoreError> {
        match self.get(key) {
            None => Ok(Vec::new()),
            Some(Value::ArrayValue(array)) => array
                .values
                .iter()
                .map(|v| match v {
                    Value::StringValue(s) => Ok(s.clone()),
                    _ => Err(self.codec_error(key, "a list of strings")),
                })
                .collect(),
            Some(_) => Err(self.codec_error(key, "a list")),
        }
    }

    /// The nested map at `key`; `None` when absent or null.
    pub fn opt_map(&self, key: &str) -> Result<Option<&'a Fields>, StoreError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::MapValue(map)) => Ok(Some(&map.fields)),
            Some(_) => Err(self.codec_error(key, "a map")),
        }
    }

    /// A reader over the nested map at `key`, reporting errors against the
    /// same document.
    pub fn nested(&self, fields: &'a Fields) -> FieldReader<'a> {
        FieldReader::new(fields, self.document)
    }
}
