//! Template synthesis from an example command line
//!
//! Produces a best-effort starting point: one command, one variable per
//! placeholder, with types guessed from the placeholder names. The result
//! is meant to be edited by a person, not trusted as-is.

use std::collections::BTreeMap;

use serde_yaml::Value;
use thiserror::Error;
use tracing::debug;

use crate::parser::{Command, Document, VariableDefinition, VariableType};
use crate::text::extract_placeholders;

pub const GENERATED_NAME: &str = "Generated Template";
pub const GENERATED_DESCRIPTION: &str = "Automatically generated template from command";
pub const GENERATED_AUTHOR: &str = "cliQ";
pub const GENERATED_COMMAND_ID: &str = "generated_cmd_1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SynthesisError {
    #[error("command string cannot be empty")]
    EmptyCommand,
}

/// Build a template around `command`, kept verbatim.
///
/// ```
/// use cliqfile::{synthesize_from_example, VariableType};
///
/// let doc = synthesize_from_example("cp {{src_file}} {{dest_path}}").unwrap();
/// let vars = &doc.commands[0].variables;
/// assert_eq!(vars[0].variable_type(), Some(VariableType::FileInput));
/// assert_eq!(vars[1].variable_type(), Some(VariableType::FileOutput));
/// ```
pub fn synthesize_from_example(command: &str) -> Result<Document, SynthesisError> {
    if command.trim().is_empty() {
        return Err(SynthesisError::EmptyCommand);
    }

    let variables: Vec<VariableDefinition> = extract_placeholders(command)
        .into_iter()
        .map(|name| variable_for(&name))
        .collect();
    debug!(variables = variables.len(), "synthesized template from example");

    Ok(Document {
        name: GENERATED_NAME.to_string(),
        description: GENERATED_DESCRIPTION.to_string(),
        version: "1.0".to_string(),
        author: GENERATED_AUTHOR.to_string(),
        template_spec_version: "1.0".to_string(),
        commands: vec![Command {
            id: GENERATED_COMMAND_ID.to_string(),
            name: "Generated Command".to_string(),
            description: "Automatically generated command".to_string(),
            command: command.to_string(),
            variables,
        }],
    })
}

fn variable_for(name: &str) -> VariableDefinition {
    let kind = infer_type(name);
    VariableDefinition {
        name: name.to_string(),
        kind: kind.as_str().to_string(),
        label: label_for(name),
        description: format!("The {} parameter", name),
        required: true,
        options: default_options(kind),
    }
}

/// Guess a type from a placeholder name; the first matching rule wins.
pub fn infer_type(name: &str) -> VariableType {
    let has = |needles: &[&str]| needles.iter().any(|n| name.contains(n));

    if name.ends_with("_file") || name.ends_with("_path") || has(&["file", "path"]) {
        if has(&["input", "src"]) {
            VariableType::FileInput
        } else if has(&["output", "dest"]) {
            VariableType::FileOutput
        } else {
            VariableType::FileInput
        }
    } else if has(&["number", "size", "width", "height"]) {
        VariableType::Number
    } else if has(&["enable", "use", "flag", "show"]) {
        VariableType::Boolean
    } else {
        VariableType::Text
    }
}

/// `output_dir-name` becomes `Output dir name`.
pub fn label_for(name: &str) -> String {
    let spaced = name.replace(['_', '-'], " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn default_options(kind: VariableType) -> BTreeMap<String, Value> {
    let pairs: Vec<(&str, Value)> = match kind {
        VariableType::FileInput | VariableType::FileOutput => {
            vec![("file_types", Value::Sequence(vec![Value::from(".*")]))]
        }
        VariableType::Number => vec![
            ("default", Value::from(1)),
            ("min", Value::from(0)),
            ("max", Value::from(100)),
        ],
        VariableType::Boolean => vec![("default", Value::from(false))],
        VariableType::Text | VariableType::Select => Vec::new(),
    };
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}
