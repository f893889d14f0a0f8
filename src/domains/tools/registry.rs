//! Schema Registry - tool descriptors and their schemas.
//!
//! This module provides:
//! - Registration of tool descriptors (name, description, input/output schema)
//! - Lookup by name
//! - Input and output validation against the declared schemas
//! - The ordered descriptor list used for discovery
//!
//! The registry is filled once during startup and only read afterwards.

use indexmap::IndexMap;
use rmcp::model::Tool;
use serde_json::{Map, Value};
use std::sync::Arc;

use super::error::RegistryError;
use super::schema::ObjectSchema;

/// A registered tool: identity plus its declared schemas.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: ObjectSchema,
    pub output_schema: ObjectSchema,
}

impl ToolDescriptor {
    /// Create a Tool model for this descriptor (discovery metadata).
    pub fn to_tool(&self) -> Tool {
        Tool {
            name: self.name.clone().into(),
            description: Some(self.description.clone().into()),
            input_schema: Arc::new(self.input_schema.to_json_schema()),
            annotations: None,
            output_schema: Some(Arc::new(self.output_schema.to_json_schema())),
            icons: None,
            meta: None,
            title: None,
        }
    }
}

/// Tool registry - name-ordered store of every descriptor.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    tools: IndexMap<String, ToolDescriptor>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool descriptor.
    pub fn register(
        &mut self,
        name: &str,
        input_schema: ObjectSchema,
        output_schema: ObjectSchema,
        description: &str,
    ) -> Result<(), RegistryError> {
        if self.tools.contains_key(name) {
            return Err(RegistryError::DuplicateTool(name.to_string()));
        }

        self.tools.insert(
            name.to_string(),
            ToolDescriptor {
                name: name.to_string(),
                description: description.to_string(),
                input_schema,
                output_schema,
            },
        );
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&ToolDescriptor, RegistryError> {
        self.tools
            .get(name)
            .ok_or_else(|| RegistryError::UnknownTool(name.to_string()))
    }

    pub fn validate_input(&self, name: &str, args: &Map<String, Value>) -> Result<(), RegistryError> {
        let descriptor = self.lookup(name)?;
        descriptor
            .input_schema
            .validate_fields(args)
            .map_err(RegistryError::from)
    }

    pub fn validate_output(&self, name: &str, data: &Value) -> Result<(), RegistryError> {
        let descriptor = self.lookup(name)?;
        descriptor.output_schema.validate(data).map_err(RegistryError::from)
    }

    /// All descriptors, in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.values()
    }

    /// Get all tool names, in registration order.
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
