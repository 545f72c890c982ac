// pkgtool-core/src/models/tools.rs
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

// --- Generic Structs for Tool Definition and Input ---

/// Defines the schema for a tool that can be presented to a host.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: ToolParametersDefinition,
}

/// Defines the parameters structure for a tool.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToolParametersDefinition {
    #[serde(rename = "type")]
    pub param_type: String,
    pub properties: BTreeMap<String, ToolParameter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

impl ToolParametersDefinition {
    /// An empty `"object"` schema, filled in with [`Self::with_property`].
    pub fn object() -> Self {
        Self {
            param_type: "object".to_string(),
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }

    pub fn with_property(mut self, name: &str, parameter: ToolParameter, required: bool) -> Self {
        self.properties.insert(name.to_string(), parameter);
        if required {
            self.required.push(name.to_string());
        }
        self
    }
}

/// Defines a single parameter within a tool's schema.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToolParameter {
    #[serde(rename = "type")]
    pub param_type: ToolParameterType,
    pub description: String,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<ToolParameter>>,
}

impl ToolParameter {
    pub fn string(description: &str) -> Self {
        Self::scalar(ToolParameterType::String, description)
    }

    pub fn boolean(description: &str) -> Self {
        Self::scalar(ToolParameterType::Boolean, description)
    }

    fn scalar(param_type: ToolParameterType, description: &str) -> Self {
        Self {
            param_type,
            description: description.to_string(),
            enum_values: None,
            items: None,
        }
    }
}

/// Represents the type of a tool parameter.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ToolParameterType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

/// Represents the input arguments provided for a tool execution at runtime.
/// Uses a map to store arguments generically.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ToolInput {
    pub arguments: BTreeMap<String, JsonValue>,
}

impl ToolInput {
    /// Builds an input from a JSON object such as `{"package": "lodash"}`.
    ///
    /// Anything other than an object (or `null`, treated as no arguments) is rejected.
    pub fn from_json(value: JsonValue) -> Result<Self, String> {
        match value {
            JsonValue::Object(map) => Ok(Self {
                arguments: map.into_iter().collect(),
            }),
            JsonValue::Null => Ok(Self::default()),
            other => Err(format!("Tool arguments must be a JSON object, got: {}", other)),
        }
    }

    pub fn with_argument(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.arguments.insert(key.to_string(), value.into());
        self
    }
}
