//! The generic parameter container consumed by the operation engine.
//!
//! `Parameters` is a bag of named, possibly repeated entries modeled on the
//! FHIR `Parameters` resource. The engine only relies on four capabilities:
//! lookup by name, removal by name, deep clone, and an emptiness check.
//! Everything else here is interop with the wire shape
//! (`{"resourceType": "Parameters", "parameter": [...]}`).

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{CoreError, Result};

/// A single named entry in a [`Parameters`] container.
///
/// `wire_key` records the JSON field the value was carried in (`valueString`,
/// `valueInteger`, `resource`, ...) so a parsed container can be rendered
/// back without guessing datatypes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterEntry {
    pub name: String,
    pub value: Value,
    pub wire_key: String,
}

impl ParameterEntry {
    /// Creates an entry, inferring the wire key from the value shape.
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        let wire_key = infer_wire_key(&value);
        Self {
            name: name.into(),
            value,
            wire_key,
        }
    }
}

/// Ordered container of named, possibly repeated parameter entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    entries: Vec<ParameterEntry>,
}

impl Parameters {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a container from `(name, value)` pairs.
    ///
    /// Repeated names produce repeated entries.
    pub fn from_pairs<N, I>(pairs: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, Value)>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(name, value)| ParameterEntry::new(name, value))
                .collect(),
        }
    }

    /// Appends a named entry.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.entries.push(ParameterEntry::new(name, value));
    }

    /// Returns the first value with the given name, if any.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.value)
    }

    /// Returns every value with the given name, in order.
    pub fn get_all(&self, name: &str) -> Vec<&Value> {
        self.entries
            .iter()
            .filter(|e| e.name == name)
            .map(|e| &e.value)
            .collect()
    }

    /// Removes and returns every value with the given name, in order.
    ///
    /// This is the consumption primitive the engine drains a cloned
    /// container with.
    pub fn take(&mut self, name: &str) -> Vec<Value> {
        let mut taken = Vec::new();
        self.entries.retain(|e| {
            if e.name == name {
                taken.push(e.value.clone());
                false
            } else {
                true
            }
        });
        taken
    }

    /// Returns true if an entry with the given name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Number of entries (repeated names count individually).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the container holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry names in order, duplicates included.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Parses a container from a JSON resource.
    ///
    /// A `Parameters` resource is read entry by entry: each entry needs a
    /// `name` and exactly one value field (`value[x]` or `resource`). Any
    /// other resource is wrapped as a single `resource` entry, matching how
    /// operation bodies that are not already `Parameters` are handled.
    pub fn from_json(value: Value) -> Result<Self> {
        let resource_type = value
            .get("resourceType")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CoreError::invalid_parameters("missing resourceType"))?;

        if resource_type != "Parameters" {
            return Ok(Self {
                entries: vec![ParameterEntry {
                    name: "resource".to_string(),
                    value,
                    wire_key: "resource".to_string(),
                }],
            });
        }

        let mut entries = Vec::new();
        if let Some(parameter) = value.get("parameter") {
            let items = parameter
                .as_array()
                .ok_or_else(|| CoreError::invalid_parameters("parameter must be an array"))?;

            for item in items {
                let obj = item
                    .as_object()
                    .ok_or_else(|| CoreError::invalid_parameters("entry must be an object"))?;
                let name = obj
                    .get("name")
                    .and_then(|n| n.as_str())
                    .ok_or_else(|| CoreError::invalid_parameters("entry without a name"))?;

                let value_field = obj
                    .iter()
                    .find(|(k, _)| k.starts_with("value") || *k == "resource");

                match value_field {
                    Some((key, v)) => entries.push(ParameterEntry {
                        name: name.to_string(),
                        value: v.clone(),
                        wire_key: key.clone(),
                    }),
                    None => {
                        return Err(CoreError::invalid_parameters(format!(
                            "entry '{name}' has no value[x] or resource field"
                        )));
                    }
                }
            }
        }

        Ok(Self { entries })
    }

    /// Renders the container back to the `Parameters` wire shape.
    pub fn to_json(&self) -> Value {
        let parameter: Vec<Value> = self
            .entries
            .iter()
            .map(|e| {
                let mut obj = serde_json::Map::new();
                obj.insert("name".to_string(), Value::String(e.name.clone()));
                obj.insert(e.wire_key.clone(), e.value.clone());
                Value::Object(obj)
            })
            .collect();

        json!({
            "resourceType": "Parameters",
            "parameter": parameter
        })
    }

    /// Consuming variant of [`Parameters::to_json`].
    pub fn into_json(self) -> Value {
        self.to_json()
    }
}

/// Picks a wire field for a programmatically supplied value.
///
/// Objects carrying a `resourceType` are resources; primitives map onto the
/// matching `value[x]` field. Anything else falls back to `valueString`.
fn infer_wire_key(value: &Value) -> String {
    match value {
        Value::Object(obj) if obj.contains_key("resourceType") => "resource".to_string(),
        Value::String(_) => "valueString".to_string(),
        Value::Bool(_) => "valueBoolean".to_string(),
        Value::Number(n) if n.is_i64() || n.is_u64() => "valueInteger".to_string(),
        Value::Number(_) => "valueDecimal".to_string(),
        _ => "valueString".to_string(),
    }
}
