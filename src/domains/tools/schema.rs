//! Structural schemas for tool arguments and tool output.
//!
//! A [`Schema`] is a plain description of the shape a JSON value must have:
//! primitive kinds, arrays, open maps, strict objects with required/optional
//! fields, and nullable wrappers. The same description is used three ways:
//!
//! - walked by [`Schema::validate`] to check arguments and handler output
//! - rendered by [`Schema::to_json_schema`] for tool discovery
//! - expanded by [`Schema::example`] into a value that satisfies it

use serde::Serialize;
use serde_json::{Map, Value, json};
use thiserror::Error;

/// Why a value failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationReason {
    /// A required field is absent.
    Missing,
    /// A field not declared by a strict object schema is present.
    Unexpected,
    /// The value has the wrong JSON kind.
    TypeMismatch,
}

/// First mismatch found while walking a value against a schema.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub struct SchemaViolation {
    /// Path to the offending field (`$` is the root).
    pub field: String,

    /// Expected kind, e.g. `string` or `array<string>`.
    pub expected_type: String,

    /// The value that was found (`null` when the field is missing).
    pub actual_value: Value,

    /// Category of the mismatch.
    pub reason: ViolationReason,
}

impl SchemaViolation {
    fn new(field: &str, expected: &Schema, actual: &Value, reason: ViolationReason) -> Self {
        Self {
            field: field.to_string(),
            expected_type: expected.type_name(),
            actual_value: actual.clone(),
            reason,
        }
    }
}

impl std::fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.reason {
            ViolationReason::Missing => write!(
                f,
                "missing required field '{}' ({})",
                self.field, self.expected_type
            ),
            ViolationReason::Unexpected => write!(f, "unexpected field '{}'", self.field),
            ViolationReason::TypeMismatch => write!(
                f,
                "field '{}': expected {}, got {}",
                self.field,
                self.expected_type,
                kind_of(&self.actual_value)
            ),
        }
    }
}

/// Structural description of a JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    String,
    Integer,
    /// Any JSON number, integral or not.
    Number,
    Boolean,
    Array(Box<Schema>),
    /// Object with arbitrary keys whose values share one schema.
    Map(Box<Schema>),
    Object(ObjectSchema),
    /// `null` or the inner schema.
    Nullable(Box<Schema>),
}

/// An object with declared fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectSchema {
    fields: Vec<FieldSchema>,
    strict: bool,
}

/// One declared field of an [`ObjectSchema`].
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    pub name: String,
    pub description: Option<String>,
    pub schema: Schema,
    pub required: bool,
}

impl Schema {
    pub fn array(items: Schema) -> Self {
        Self::Array(Box::new(items))
    }

    pub fn map(values: Schema) -> Self {
        Self::Map(Box::new(values))
    }

    pub fn nullable(inner: Schema) -> Self {
        Self::Nullable(Box::new(inner))
    }

    /// Short human-readable name of the expected kind.
    pub fn type_name(&self) -> String {
        match self {
            Self::String => "string".to_string(),
            Self::Integer => "integer".to_string(),
            Self::Number => "number".to_string(),
            Self::Boolean => "boolean".to_string(),
            Self::Array(items) => format!("array<{}>", items.type_name()),
            Self::Map(values) => format!("map<{}>", values.type_name()),
            Self::Object(_) => "object".to_string(),
            Self::Nullable(inner) => format!("{} | null", inner.type_name()),
        }
    }

    /// Validate `value`, reporting the first mismatch.
    pub fn validate(&self, value: &Value) -> Result<(), SchemaViolation> {
        self.walk(value, "$")
    }

    fn walk(&self, value: &Value, path: &str) -> Result<(), SchemaViolation> {
        let mismatch =
            || Err(SchemaViolation::new(path, self, value, ViolationReason::TypeMismatch));

        match self {
            Self::String if value.is_string() => Ok(()),
            Self::Integer if value.is_i64() || value.is_u64() => Ok(()),
            Self::Number if value.is_number() => Ok(()),
            Self::Boolean if value.is_boolean() => Ok(()),
            Self::Nullable(_) if value.is_null() => Ok(()),
            Self::Nullable(inner) => inner.walk(value, path),
            Self::Array(items) => match value.as_array() {
                Some(elements) => elements
                    .iter()
                    .enumerate()
                    .try_for_each(|(i, element)| items.walk(element, &format!("{path}[{i}]"))),
                None => mismatch(),
            },
            Self::Map(values) => match value.as_object() {
                Some(entries) => entries
                    .iter()
                    .try_for_each(|(key, entry)| values.walk(entry, &join(path, key))),
                None => mismatch(),
            },
            Self::Object(object) => match value.as_object() {
                Some(entries) => object.walk(entries, path),
                None => mismatch(),
            },
            _ => mismatch(),
        }
    }

    /// Render as a JSON Schema document fragment.
    pub fn to_json_schema(&self) -> Value {
        match self {
            Self::String => json!({ "type": "string" }),
            Self::Integer => json!({ "type": "integer" }),
            Self::Number => json!({ "type": "number" }),
            Self::Boolean => json!({ "type": "boolean" }),
            Self::Array(items) => json!({ "type": "array", "items": items.to_json_schema() }),
            Self::Map(values) => json!({
                "type": "object",
                "additionalProperties": values.to_json_schema()
            }),
            Self::Object(object) => Value::Object(object.to_json_schema()),
            Self::Nullable(inner) => json!({
                "anyOf": [inner.to_json_schema(), { "type": "null" }]
            }),
        }
    }

    /// Build a value that satisfies this schema, optional fields included.
    pub fn example(&self) -> Value {
        match self {
            Self::String => json!("example"),
            Self::Integer => json!(0),
            Self::Number => json!(0.5),
            Self::Boolean => json!(false),
            Self::Array(items) => json!([items.example()]),
            Self::Map(values) => json!({ "key": values.example() }),
            Self::Object(object) => Value::Object(object.example()),
            Self::Nullable(inner) => inner.example(),
        }
    }
}

impl ObjectSchema {
    /// An object that rejects undeclared fields.
    pub fn strict() -> Self {
        Self {
            fields: Vec::new(),
            strict: true,
        }
    }

    /// An object that ignores undeclared fields.
    pub fn open() -> Self {
        Self {
            fields: Vec::new(),
            strict: false,
        }
    }

    #[must_use]
    pub fn required(self, name: &str, schema: Schema, description: &str) -> Self {
        self.field(name, schema, description, true)
    }

    #[must_use]
    pub fn optional(self, name: &str, schema: Schema, description: &str) -> Self {
        self.field(name, schema, description, false)
    }

    fn field(mut self, name: &str, schema: Schema, description: &str, required: bool) -> Self {
        self.fields.push(FieldSchema {
            name: name.to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            schema,
            required,
        });
        self
    }

    fn get(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Validate an object value, reporting the first mismatch.
    pub fn validate(&self, value: &Value) -> Result<(), SchemaViolation> {
        match value.as_object() {
            Some(entries) => self.walk(entries, "$"),
            None => Err(SchemaViolation {
                field: "$".to_string(),
                expected_type: "object".to_string(),
                actual_value: value.clone(),
                reason: ViolationReason::TypeMismatch,
            }),
        }
    }

    /// Validate the entries of an object value.
    pub fn validate_fields(&self, entries: &Map<String, Value>) -> Result<(), SchemaViolation> {
        self.walk(entries, "$")
    }

    fn walk(&self, entries: &Map<String, Value>, path: &str) -> Result<(), SchemaViolation> {
        for field in &self.fields {
            match entries.get(&field.name) {
                Some(value) => field.schema.walk(value, &join(path, &field.name))?,
                None if field.required => {
                    return Err(SchemaViolation::new(
                        &join(path, &field.name),
                        &field.schema,
                        &Value::Null,
                        ViolationReason::Missing,
                    ));
                }
                None => {}
            }
        }

        if self.strict {
            if let Some((key, value)) = entries.iter().find(|(key, _)| self.get(key).is_none()) {
                return Err(SchemaViolation {
                    field: join(path, key),
                    expected_type: "no such field".to_string(),
                    actual_value: value.clone(),
                    reason: ViolationReason::Unexpected,
                });
            }
        }

        Ok(())
    }

    /// Render as a JSON Schema object.
    pub fn to_json_schema(&self) -> Map<String, Value> {
        let mut properties = Map::new();
        for field in &self.fields {
            let mut rendered = field.schema.to_json_schema();
            if let (Some(description), Some(obj)) = (&field.description, rendered.as_object_mut()) {
                obj.insert("description".to_string(), json!(description));
            }
            properties.insert(field.name.clone(), rendered);
        }

        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect();

        let mut schema = Map::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".to_string(), json!(required));
        }
        schema.insert("additionalProperties".to_string(), json!(!self.strict));
        schema
    }

    pub fn example(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), f.schema.example()))
            .collect()
    }
}

fn join(path: &str, key: &str) -> String {
    if path == "$" {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
