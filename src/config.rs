//! Configuration for template generation
//!
//! Defaults are read from a TOML file:
//!
//! ```toml
//! [defaults]
//! author = "Jane"
//! version = "2.0"
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::parser::Document;

pub const TEMPLATE_VERSION: &str = "1.0";
pub const TEMPLATE_SPEC_VERSION: &str = "1.0";

/// Errors that can occur when loading a config file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: TemplateDefaults,
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load config from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

/// Top-level metadata supplied by the caller for generated templates
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TemplateDefaults {
    pub version: String,
    pub template_spec_version: String,
    pub author: String,
    pub name: String,
    pub description: String,
}

impl Default for TemplateDefaults {
    fn default() -> Self {
        Self {
            version: TEMPLATE_VERSION.to_string(),
            template_spec_version: TEMPLATE_SPEC_VERSION.to_string(),
            author: String::new(),
            name: String::new(),
            description: String::new(),
        }
    }
}

impl TemplateDefaults {
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Fill the document's empty top-level fields; set fields are left alone.
    pub fn apply(&self, document: &mut Document) {
        fill(&mut document.version, &self.version);
        fill(&mut document.template_spec_version, &self.template_spec_version);
        fill(&mut document.author, &self.author);
        fill(&mut document.name, &self.name);
        fill(&mut document.description, &self.description);
    }

    /// Replace top-level fields with every non-empty default.
    pub fn overlay(&self, document: &mut Document) {
        for (field, value) in [
            (&mut document.version, &self.version),
            (&mut document.template_spec_version, &self.template_spec_version),
            (&mut document.author, &self.author),
            (&mut document.name, &self.name),
            (&mut document.description, &self.description),
        ] {
            if !value.is_empty() {
                field.clone_from(value);
            }
        }
    }
}

fn fill(field: &mut String, value: &str) {
    if field.is_empty() && !value.is_empty() {
        *field = value.to_string();
    }
}
