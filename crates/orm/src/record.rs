//! Records - ordered field/value mappings exchanged with the database
//!
//! A `Record` is the untyped shape of a row: what callers pass to `save`,
//! `fetch` and `delete`, and what a backend hands back before it is parsed
//! into the model's row type. Field order is preserved so rendered SQL is
//! deterministic.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::backends::DatabaseValue;
use crate::error::{ModelError, ModelResult};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: IndexMap<String, DatabaseValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style `set`
    pub fn with(mut self, field: impl Into<String>, value: impl Into<DatabaseValue>) -> Self {
        self.set(field, value);
        self
    }

    /// Set a field, replacing any previous value in place
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<DatabaseValue>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Mark a field as explicitly cleared; it is written as NULL
    pub fn unset(&mut self, field: impl Into<String>) {
        self.fields.insert(field.into(), DatabaseValue::Null);
    }

    pub fn get(&self, field: &str) -> Option<&DatabaseValue> {
        self.fields.get(field)
    }

    pub fn remove(&mut self, field: &str) -> Option<DatabaseValue> {
        self.fields.shift_remove(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// True when the field is missing or holds NULL
    pub fn is_absent(&self, field: &str) -> bool {
        self.fields.get(field).map_or(true, DatabaseValue::is_null)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DatabaseValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut DatabaseValue)> {
        self.fields.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    /// Build a record from a JSON object
    pub fn from_json(value: JsonValue) -> ModelResult<Self> {
        match value {
            JsonValue::Object(map) => Ok(map
                .into_iter()
                .map(|(field, value)| (field, DatabaseValue::from_json(value)))
                .collect()),
            other => Err(ModelError::Serialization(format!(
                "Expected a JSON object for a record, got {}",
                other
            ))),
        }
    }

    /// Build a record from any serializable value, typically a partial row
    /// struct whose `None` fields become NULL
    pub fn from_serialize<S: Serialize + ?Sized>(value: &S) -> ModelResult<Self> {
        Self::from_json(serde_json::to_value(value)?)
    }

    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            self.fields
                .iter()
                .map(|(field, value)| (field.clone(), value.to_json()))
                .collect(),
        )
    }

    /// Deserialize the record into a typed row
    pub fn deserialize<T: DeserializeOwned>(&self) -> ModelResult<T> {
        serde_json::from_value(self.to_json()).map_err(ModelError::from)
    }
}

impl FromIterator<(String, DatabaseValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, DatabaseValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Record {
    type Item = (String, DatabaseValue);
    type IntoIter = indexmap::map::IntoIter<String, DatabaseValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl TryFrom<JsonValue> for Record {
    type Error = ModelError;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        Self::from_json(value)
    }
}
