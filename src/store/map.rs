use crate::errors::{AppError, AppResult};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// Command name to command definition, in insertion order.
///
/// Order is part of the data: the UI renders entries in this order and a
/// rename keeps the entry where it was. Keys are kept in `keys` and values
/// looked up through `values`; the two always hold the same key set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandMap {
    keys: Vec<String>,
    values: HashMap<String, Value>,
}

impl CommandMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.keys.iter().position(|existing| existing == key)
    }

    /// Inserts or overwrites. An overwritten key keeps its position; a new
    /// key is appended.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        if !self.values.contains_key(&key) {
            self.keys.push(key.clone());
        }
        self.values.insert(key, value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.keys.iter().filter_map(|key| self.values.get(key).map(|value| (key.as_str(), value)))
    }

    /// Copy of the map with every entry except `key`.
    pub fn without(&self, key: &str) -> CommandMap {
        let mut next = CommandMap::new();
        for (existing, value) in self.iter() {
            if existing != key {
                next.insert(existing, value.clone());
            }
        }
        next
    }

    /// Rebuilds the map in order, putting `new_key => value` at the slot
    /// `old_key` occupied. Returns `None` when `old_key` is absent.
    pub fn renamed(&self, old_key: &str, new_key: &str, value: Value) -> Option<CommandMap> {
        if !self.contains_key(old_key) {
            return None;
        }
        let mut next = CommandMap::new();
        for (existing, existing_value) in self.iter() {
            if existing == old_key {
                next.insert(new_key, value.clone());
            } else {
                next.insert(existing, existing_value.clone());
            }
        }
        Some(next)
    }

    pub fn to_json(&self) -> Value {
        let mut object = Map::with_capacity(self.len());
        for (key, value) in self.iter() {
            object.insert(key.to_string(), value.clone());
        }
        Value::Object(object)
    }

    pub fn from_json_object(object: Map<String, Value>) -> Self {
        let mut map = CommandMap::new();
        for (key, value) in object {
            map.insert(key, value);
        }
        map
    }

    /// Accepts only a JSON object; anything else is a validation failure.
    pub fn from_json(value: Value) -> AppResult<Self> {
        match value {
            Value::Object(object) => Ok(Self::from_json_object(object)),
            other => Err(AppError::Validation(format!(
                "command store must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Serialize for CommandMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct CommandMapVisitor;

impl<'de> Visitor<'de> for CommandMapVisitor {
    type Value = CommandMap;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a JSON object of command records")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = CommandMap::new();
        while let Some((key, value)) = access.next_entry::<String, Value>()? {
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<'de> Deserialize<'de> for CommandMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(CommandMapVisitor)
    }
}
