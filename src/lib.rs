//! cliqfile - parameterized command templates
//!
//! A template names one or more command lines with `{{variable}}`
//! placeholders, plus metadata describing each placeholder so an
//! application can render a form and substitute the collected values.
//! This crate parses, validates and generates template files; it never
//! executes commands or resolves values.
//!
//! # Example
//!
//! ```rust
//! use cliqfile::{load, encode};
//!
//! let source = r#"
//! name: Greeter
//! description: Say hello
//! version: "1.0"
//! author: Me
//! template_spec_version: "1.0"
//! commands:
//!   - name: greet
//!     description: Print a greeting
//!     command: echo hello {{who}}
//!     variables:
//!       - name: who
//!         type: string
//!         label: Who
//! "#;
//!
//! let doc = load(source.as_bytes()).unwrap();
//! assert_eq!(doc.commands[0].variables[0].name, "who");
//! assert!(encode(&doc).unwrap().contains("echo hello {{who}}"));
//! ```

pub mod config;
pub mod encode;
pub mod error;
pub mod generator;
pub mod parser;
pub mod text;
pub mod validate;

pub use config::{Config, ConfigError, TemplateDefaults};
pub use encode::encode;
pub use error::{EncodeError, SyntaxError};
pub use generator::{synthesize_from_example, SynthesisError};
pub use parser::{decode, Command, Document, Position, VariableDefinition, VariableType};
pub use text::{
    extract_placeholders, strip_presentation, strip_think_tags, transport_decode,
    transport_encode, TransportError,
};
pub use validate::{validate, Diagnostic};

use thiserror::Error;
use tracing::debug;

/// Errors from loading a template for use
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("template has {} problem(s): {}", .0.len(), format_diagnostics(.0))]
    Invalid(Vec<Diagnostic>),
}

/// Errors from normalizing machine-generated template text
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("YAML parse error: {0}")]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("validation error: {}", summarize(.0))]
    Invalid(Vec<Diagnostic>),
}

impl NormalizeError {
    /// Diagnostics that rejected the text, empty for other failures
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            NormalizeError::Invalid(diagnostics) => diagnostics,
            _ => &[],
        }
    }

    /// One-line `field: message; ` summary, suitable for a retry prompt
    pub fn summary(&self) -> String {
        match self {
            NormalizeError::Invalid(diagnostics) => summarize(diagnostics),
            other => other.to_string(),
        }
    }
}

fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

fn summarize(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| format!("{}: {}; ", d.field, d.message))
        .collect()
}

/// Validate and then decode a template, rejecting any diagnostic.
///
/// This is the import path: untrusted text only becomes a [`Document`]
/// once the validator has nothing to say about it.
pub fn load(bytes: &[u8]) -> Result<Document, LoadError> {
    let diagnostics = validate(bytes)?;
    if !diagnostics.is_empty() {
        debug!(count = diagnostics.len(), "rejecting template");
        return Err(LoadError::Invalid(diagnostics));
    }
    Ok(decode(bytes)?)
}

/// Turn raw generated text into canonical, validated template text.
///
/// Strips reasoning spans and a wrapping fence, decodes, fills empty
/// metadata from `defaults`, re-encodes and validates the re-encoded text.
/// Callers driving a retry loop can feed [`NormalizeError::summary`] back
/// to the generator.
pub fn normalize_generated(
    raw: &str,
    defaults: &TemplateDefaults,
) -> Result<String, NormalizeError> {
    let cleaned = strip_presentation(raw);
    let mut document = decode(cleaned.as_bytes())?;
    defaults.apply(&mut document);

    let canonical = encode(&document)?;
    let diagnostics = validate(canonical.as_bytes())?;
    if !diagnostics.is_empty() {
        debug!(count = diagnostics.len(), "generated template failed validation");
        return Err(NormalizeError::Invalid(diagnostics));
    }
    Ok(canonical)
}
