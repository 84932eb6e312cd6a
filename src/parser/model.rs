//! Typed document model for cliQ templates
//!
//! Decoding is deliberately lenient: missing or null fields fall back to
//! empty values, and numbers or booleans in text fields keep the exact text
//! they were written with. Whether a document is usable is the validator's
//! call, not the decoder's.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Root of a template file
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Document {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub author: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub template_spec_version: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<Command>,
}

/// One invocable command with its placeholders
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Command {
    /// Assigned by generators; hand-written templates usually omit it
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Command line containing `{{name}}` placeholders
    #[serde(skip_serializing_if = "String::is_empty")]
    pub command: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<VariableDefinition>,
}

impl Command {
    /// Find a declared variable by name
    pub fn variable(&self, name: &str) -> Option<&VariableDefinition> {
        self.variables.iter().find(|v| v.name == name)
    }
}

/// Metadata for a single placeholder
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VariableDefinition {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Raw type token; kept as text so unknown kinds survive decoding
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "is_false")]
    pub required: bool,
    /// Type-dependent settings such as `min`, `max`, `default` or `file_types`
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, serde_yaml::Value>,
}

impl VariableDefinition {
    /// The recognized type, or `None` when the token is empty or unknown
    pub fn variable_type(&self) -> Option<VariableType> {
        self.kind.parse().ok()
    }
}

/// The closed set of placeholder kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableType {
    Text,
    FileInput,
    FileOutput,
    Number,
    Boolean,
    Select,
}

impl VariableType {
    pub const ALL: [VariableType; 6] = [
        VariableType::Text,
        VariableType::FileInput,
        VariableType::FileOutput,
        VariableType::Number,
        VariableType::Boolean,
        VariableType::Select,
    ];

    /// Canonical token written to template files
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableType::Text => "string",
            VariableType::FileInput => "file_input",
            VariableType::FileOutput => "file_output",
            VariableType::Number => "number",
            VariableType::Boolean => "boolean",
            VariableType::Select => "select",
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, VariableType::FileInput | VariableType::FileOutput)
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariableType(pub String);

impl fmt::Display for UnknownVariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid type '{}'", self.0)
    }
}

impl std::error::Error for UnknownVariableType {}

impl FromStr for VariableType {
    type Err = UnknownVariableType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" | "text" => Ok(VariableType::Text),
            "file_input" => Ok(VariableType::FileInput),
            "file_output" => Ok(VariableType::FileOutput),
            "number" => Ok(VariableType::Number),
            "boolean" => Ok(VariableType::Boolean),
            "select" => Ok(VariableType::Select),
            other => Err(UnknownVariableType(other.to_string())),
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}
