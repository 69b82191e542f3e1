//! Structural input schemas for tool arguments.
//!
//! Arguments are checked against a typed schema before a handler ever runs,
//! so handlers never see malformed input. Serializes to the JSON-Schema shape
//! clients expect in a tool manifest.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// Property value type.
#[derive(Debug, Clone, PartialEq)]
pub enum PropKind {
    String,
    Integer,
    Boolean,
    Object,
    Array(Box<PropKind>),
}

impl PropKind {
    fn type_name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array(_) => "array",
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array(item) => value
                .as_array()
                .map(|items| items.iter().all(|v| item.matches(v)))
                .unwrap_or(false),
        }
    }
}

/// A single property schema.
#[derive(Debug, Clone)]
pub struct PropSchema {
    kind: PropKind,
    description: String,
    minimum: Option<i64>,
    default: Option<Value>,
}

impl PropSchema {
    pub fn new(kind: PropKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            minimum: None,
            default: None,
        }
    }

    pub fn string(description: impl Into<String>) -> Self {
        Self::new(PropKind::String, description)
    }

    pub fn integer(description: impl Into<String>) -> Self {
        Self::new(PropKind::Integer, description)
    }

    pub fn boolean(description: impl Into<String>) -> Self {
        Self::new(PropKind::Boolean, description)
    }

    pub fn array(item: PropKind, description: impl Into<String>) -> Self {
        Self::new(PropKind::Array(Box::new(item)), description)
    }

    /// Lower bound for integer properties.
    pub fn minimum(mut self, min: i64) -> Self {
        self.minimum = Some(min);
        self
    }

    /// Default value advertised in the manifest.
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// Structural schema for a tool's arguments object.
///
/// Property order is preserved for stable manifests.
#[derive(Debug, Clone, Default)]
pub struct InputSchema {
    properties: Vec<(String, PropSchema)>,
    required: Vec<String>,
}

impl InputSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a property; `required` marks it mandatory.
    pub fn property(mut self, name: impl Into<String>, schema: PropSchema, required: bool) -> Self {
        let name = name.into();
        if required {
            self.required.push(name.clone());
        }
        self.properties.push((name, schema));
        self
    }

    /// Check an arguments value against this schema.
    ///
    /// Returns every violation, not just the first.
    pub fn validate(&self, arguments: &Value) -> std::result::Result<(), Vec<String>> {
        let mut violations = Vec::new();

        let obj = match arguments.as_object() {
            Some(obj) => obj,
            None => return Err(vec!["arguments must be an object".to_string()]),
        };

        for name in &self.required {
            if !obj.contains_key(name) {
                violations.push(format!("missing required property '{}'", name));
            }
        }

        for (name, schema) in &self.properties {
            let value = match obj.get(name) {
                Some(v) if !v.is_null() => v,
                _ => continue,
            };

            if !schema.kind.matches(value) {
                violations.push(format!(
                    "property '{}' must be of type {}",
                    name,
                    schema.kind.type_name()
                ));
                continue;
            }

            if let (Some(min), Some(n)) = (schema.minimum, value.as_i64()) {
                if n < min {
                    violations.push(format!("property '{}' must be >= {}", name, min));
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

impl Serialize for InputSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("type", "object")?;

        let mut properties = serde_json::Map::new();
        for (name, schema) in &self.properties {
            properties.insert(name.clone(), prop_to_json(schema));
        }
        map.serialize_entry("properties", &properties)?;

        if !self.required.is_empty() {
            map.serialize_entry("required", &self.required)?;
        }
        map.end()
    }
}

fn prop_to_json(schema: &PropSchema) -> Value {
    let mut obj = serde_json::Map::new();
    obj.insert("type".to_string(), Value::String(schema.kind.type_name().to_string()));
    if !schema.description.is_empty() {
        obj.insert("description".to_string(), Value::String(schema.description.clone()));
    }
    if let PropKind::Array(item) = &schema.kind {
        obj.insert(
            "items".to_string(),
            serde_json::json!({"type": item.type_name()}),
        );
    }
    if let Some(min) = schema.minimum {
        obj.insert("minimum".to_string(), serde_json::json!(min));
    }
    if let Some(default) = &schema.default {
        obj.insert("default".to_string(), default.clone());
    }
    Value::Object(obj)
}
