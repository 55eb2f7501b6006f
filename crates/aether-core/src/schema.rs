// ABOUTME: Tool declarations and the parameter schema subset understood by the model service.
// ABOUTME: Types serialize as STRING/NUMBER/INTEGER/BOOLEAN/ARRAY/OBJECT with nested properties.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

/// A parameter schema. Built with the constructors and chained setters below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "type")]
    pub schema_type: SchemaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
}

impl Schema {
    fn of(schema_type: SchemaType) -> Self {
        Self {
            schema_type,
            description: None,
            items: None,
            properties: BTreeMap::new(),
            required: Vec::new(),
            enum_values: Vec::new(),
        }
    }

    pub fn object() -> Self {
        Self::of(SchemaType::Object)
    }

    pub fn string(description: &str) -> Self {
        Self::of(SchemaType::String).describe(description)
    }

    pub fn number(description: &str) -> Self {
        Self::of(SchemaType::Number).describe(description)
    }

    pub fn integer(description: &str) -> Self {
        Self::of(SchemaType::Integer).describe(description)
    }

    pub fn boolean(description: &str) -> Self {
        Self::of(SchemaType::Boolean).describe(description)
    }

    pub fn array(items: Schema, description: &str) -> Self {
        let mut schema = Self::of(SchemaType::Array).describe(description);
        schema.items = Some(Box::new(items));
        schema
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Restrict a string schema to a fixed set of values.
    pub fn one_of(mut self, values: Vec<String>) -> Self {
        self.enum_values = values;
        self
    }

    /// Add a required property to an object schema.
    pub fn required_property(mut self, name: &str, schema: Schema) -> Self {
        self.properties.insert(name.to_string(), schema);
        self.required.push(name.to_string());
        self
    }

    /// Add an optional property to an object schema.
    pub fn optional_property(mut self, name: &str, schema: Schema) -> Self {
        self.properties.insert(name.to_string(), schema);
        self
    }
}

/// The static description of a tool as sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Schema,
}

impl ToolDeclaration {
    pub fn new(name: &str, description: &str, parameters: Schema) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
        }
    }
}
