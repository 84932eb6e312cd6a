//! Decoder from raw bytes to the typed [`Document`]
//!
//! The document is read off the positioned tree, so text fields keep the
//! exact characters they were written with: `1.10` stays `"1.10"`.

use std::collections::BTreeMap;

use serde_yaml::Value;
use tracing::debug;

use super::model::{Command, Document, VariableDefinition};
use super::tree::{parse_tree, Entry, Node, NodeValue, ScalarStyle, Tree};
use crate::error::SyntaxError;

/// Decode a template buffer without validating it.
///
/// Only malformed YAML, or a node of the wrong shape (a list where text
/// belongs), fails. A document with empty fields or no commands decodes
/// successfully; run [`crate::validate`] to find out what is missing.
pub fn decode(bytes: &[u8]) -> Result<Document, SyntaxError> {
    let text = std::str::from_utf8(bytes)?;
    let root = match parse_tree(text)? {
        Tree::Empty => {
            debug!("decoding blank template buffer to an empty document");
            return Ok(Document::default());
        }
        Tree::NotMapping { kind, position } => {
            return Err(SyntaxError::new(
                format!("expected a mapping at the document root, found a {}", kind),
                position,
            ));
        }
        Tree::Mapping(root) => root,
    };

    let document = read_document(&root)?;
    debug!(
        name = %document.name,
        commands = document.commands.len(),
        "decoded template"
    );
    Ok(document)
}

fn read_document(root: &Node) -> Result<Document, SyntaxError> {
    let mut document = Document::default();
    for entry in fields(root, "document")? {
        match entry.key.as_str() {
            "name" => document.name = text(entry)?,
            "description" => document.description = text(entry)?,
            "version" => document.version = text(entry)?,
            "author" => document.author = text(entry)?,
            "template_spec_version" => document.template_spec_version = text(entry)?,
            "commands" => document.commands = list(entry, command)?,
            _ => {}
        }
    }
    Ok(document)
}

fn command(node: &Node) -> Result<Command, SyntaxError> {
    let mut command = Command::default();
    if is_null(node) {
        return Ok(command);
    }
    for entry in fields(node, "commands item")? {
        match entry.key.as_str() {
            "id" => command.id = text(entry)?,
            "name" => command.name = text(entry)?,
            "description" => command.description = text(entry)?,
            "command" => command.command = text(entry)?,
            "variables" => command.variables = list(entry, variable)?,
            _ => {}
        }
    }
    Ok(command)
}

fn variable(node: &Node) -> Result<VariableDefinition, SyntaxError> {
    let mut variable = VariableDefinition::default();
    if is_null(node) {
        return Ok(variable);
    }
    for entry in fields(node, "variables item")? {
        match entry.key.as_str() {
            "name" => variable.name = text(entry)?,
            "type" => variable.kind = text(entry)?,
            "label" => variable.label = text(entry)?,
            "description" => variable.description = text(entry)?,
            "required" => variable.required = flag(entry)?,
            "options" => variable.options = options(entry)?,
            _ => {}
        }
    }
    Ok(variable)
}

fn is_null(node: &Node) -> bool {
    node.as_plain_scalar() == Some("")
}

fn mismatch(what: &str, expected: &str, node: &Node) -> SyntaxError {
    SyntaxError::new(
        format!("{}: expected {}, found a {}", what, expected, node.kind()),
        node.position,
    )
}

fn fields<'a>(node: &'a Node, what: &str) -> Result<&'a [Entry], SyntaxError> {
    node.as_mapping()
        .ok_or_else(|| mismatch(what, "a mapping", node))
}

fn text(entry: &Entry) -> Result<String, SyntaxError> {
    entry
        .value
        .as_scalar()
        .map(str::to_string)
        .ok_or_else(|| mismatch(&entry.key, "a scalar", &entry.value))
}

fn list<T>(
    entry: &Entry,
    item: fn(&Node) -> Result<T, SyntaxError>,
) -> Result<Vec<T>, SyntaxError> {
    if is_null(&entry.value) {
        return Ok(Vec::new());
    }
    entry
        .value
        .as_sequence()
        .ok_or_else(|| mismatch(&entry.key, "a sequence", &entry.value))?
        .iter()
        .map(item)
        .collect()
}

fn flag(entry: &Entry) -> Result<bool, SyntaxError> {
    match resolve(&entry.value) {
        Value::Null => Ok(false),
        Value::Bool(value) => Ok(value),
        _ => Err(mismatch(&entry.key, "a boolean", &entry.value)),
    }
}

fn options(entry: &Entry) -> Result<BTreeMap<String, Value>, SyntaxError> {
    if is_null(&entry.value) {
        return Ok(BTreeMap::new());
    }
    Ok(fields(&entry.value, &entry.key)?
        .iter()
        .map(|option| (option.key.clone(), resolve(&option.value)))
        .collect())
}

/// Option values keep YAML's types: plain scalars resolve to null, booleans
/// or numbers, while quoted and block scalars are always strings.
fn resolve(node: &Node) -> Value {
    match &node.value {
        NodeValue::Scalar {
            text,
            style: ScalarStyle::Plain,
        } => resolve_plain(text),
        NodeValue::Scalar { text, .. } => Value::String(text.clone()),
        NodeValue::Sequence(items) => Value::Sequence(items.iter().map(resolve).collect()),
        NodeValue::Mapping(entries) => Value::Mapping(
            entries
                .iter()
                .map(|entry| (Value::String(entry.key.clone()), resolve(&entry.value)))
                .collect(),
        ),
    }
}

fn resolve_plain(text: &str) -> Value {
    if text.is_empty() {
        return Value::Null;
    }
    // out-of-range numbers fail to resolve and stay text
    match serde_yaml::from_str::<Value>(text) {
        Ok(value @ (Value::Bool(_) | Value::Number(_) | Value::String(_))) => value,
        _ => Value::String(text.to_string()),
    }
}
