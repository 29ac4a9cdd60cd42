//! Declarative function descriptors and their wire schema.
//!
//! ```rust
//! use ptooling::{FunctionDescriptor, ParameterDescriptor};
//!
//! let descriptor = FunctionDescriptor::new("searchDocs")
//!     .with_description("Search project documentation")
//!     .with_status_message("Searching docs...")
//!     .with_parameter(ParameterDescriptor::string("query").required());
//!
//! let definition = descriptor.to_definition();
//! assert_eq!(definition.name, "searchDocs");
//! assert_eq!(definition.parameters["required"][0], "query");
//! ```

use pprovider::FunctionDefinition;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Number,
}

impl ParameterType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    pub name: String,
    pub kind: ParameterType,
    pub required: bool,
    pub description: Option<String>,
    pub allowed_values: Option<Vec<Value>>,
}

impl ParameterDescriptor {
    pub fn new(name: impl Into<String>, kind: ParameterType) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            description: None,
            allowed_values: None,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ParameterType::String)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, ParameterType::Number)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_allowed_values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.allowed_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    fn property(&self) -> Value {
        let mut property = Map::new();
        property.insert("type".to_string(), json!(self.kind.as_str()));
        if let Some(description) = &self.description {
            property.insert("description".to_string(), json!(description));
        }
        if let Some(values) = &self.allowed_values {
            property.insert("enum".to_string(), Value::Array(values.clone()));
        }

        Value::Object(property)
    }
}

/// Everything the registry knows about one callable function besides its handler.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDescriptor {
    pub name: String,
    pub parameters: Vec<ParameterDescriptor>,
    pub description: Option<String>,
    /// Text a host may display while the call runs.
    pub status_message: Option<String>,
}

impl FunctionDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            description: None,
            status_message: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_status_message(mut self, status_message: impl Into<String>) -> Self {
        self.status_message = Some(status_message.into());
        self
    }

    pub fn with_parameter(mut self, parameter: ParameterDescriptor) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn to_definition(&self) -> FunctionDefinition {
        let required = self
            .parameters
            .iter()
            .filter(|parameter| parameter.required)
            .map(|parameter| json!(parameter.name))
            .collect::<Vec<_>>();

        let properties = self
            .parameters
            .iter()
            .map(|parameter| (parameter.name.clone(), parameter.property()))
            .collect::<Map<_, _>>();

        FunctionDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: json!({
                "type": "object",
                "required": required,
                "properties": properties,
            }),
        }
    }
}
