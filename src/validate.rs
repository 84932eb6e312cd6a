//! Structural validation of template files.
//!
//! Walks the positioned [`Tree`] rather than the decoded [`crate::Document`]
//! so every problem can be reported with its line and column. All problems
//! are collected in one pass; traversal only stops below a node whose kind
//! makes deeper checks meaningless.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::error::{render_report, SyntaxError};
use crate::parser::{parse_tree, Entry, Node, Position, Tree, VariableType};
use crate::text::extract_placeholders;

const ROOT_FIELDS: [&str; 6] = [
    "name",
    "description",
    "version",
    "author",
    "template_spec_version",
    "commands",
];
const COMMAND_FIELDS: [&str; 3] = ["name", "description", "command"];
const VARIABLE_FIELDS: [&str; 3] = ["name", "type", "label"];

/// A located, non-fatal problem in a template
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// 1-based line, 0 when unknown
    pub line: usize,
    pub column: usize,
    /// Offending field name, or "" when the problem concerns a whole node
    pub field: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(position: Position, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            line: position.line,
            column: position.column,
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    /// Format the diagnostic with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        if self.position().is_unknown() {
            return format!("Error: {}\n", self.message);
        }
        let label = if self.field.is_empty() {
            self.message.clone()
        } else {
            format!("{}: {}", self.field, self.message)
        };
        render_report(source, filename, self.position(), &self.message, &label)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}: {} - {}", self.line, self.field, self.message)
    }
}

/// Validate a template buffer.
///
/// Returns every diagnostic found, in document order. Errors only when the
/// buffer is not well-formed YAML.
pub fn validate(bytes: &[u8]) -> Result<Vec<Diagnostic>, SyntaxError> {
    let text = std::str::from_utf8(bytes)?;
    let diagnostics = match parse_tree(text)? {
        Tree::Empty => vec![Diagnostic::new(Position::UNKNOWN, "", "Empty document")],
        Tree::NotMapping { position, .. } => vec![Diagnostic::new(
            position,
            "",
            "Root must be a mapping (object)",
        )],
        Tree::Mapping(root) => {
            let mut diagnostics = Vec::new();
            validate_root(&root, &mut diagnostics);
            diagnostics
        }
    };
    debug!(count = diagnostics.len(), "validated template");
    Ok(diagnostics)
}

fn validate_root(root: &Node, out: &mut Vec<Diagnostic>) {
    let entries = root.as_mapping().unwrap_or_default();
    for entry in entries {
        check_not_empty(entry, &ROOT_FIELDS, out);
        if entry.key == "commands" {
            validate_commands(&entry.value, out);
        }
    }
    report_missing(root, &ROOT_FIELDS, "Missing required field", out);
}

fn validate_commands(node: &Node, out: &mut Vec<Diagnostic>) {
    let Some(commands) = node.as_sequence() else {
        out.push(Diagnostic::new(node.position, "commands", "commands must be a list"));
        return;
    };
    if commands.is_empty() {
        out.push(Diagnostic::new(
            node.position,
            "commands",
            "commands list cannot be empty",
        ));
    }
    for command in commands {
        validate_command(command, out);
    }
}

fn validate_command(node: &Node, out: &mut Vec<Diagnostic>) {
    let Some(entries) = node.as_mapping() else {
        out.push(Diagnostic::new(node.position, "", "Command must be an object"));
        return;
    };

    let mut command_text = "";
    let mut variables = None;
    for entry in entries {
        check_not_empty(entry, &COMMAND_FIELDS, out);
        match entry.key.as_str() {
            "command" => command_text = entry.value.text(),
            "variables" => variables = Some(&entry.value),
            _ => {}
        }
    }
    report_missing(node, &COMMAND_FIELDS, "Missing required field in command", out);

    let declared = match variables {
        Some(vars) => validate_variables(vars, out),
        None => Vec::new(),
    };

    // Declared variables on a command with no command text are never
    // reported as unused.
    if command_text.is_empty() {
        return;
    }
    let used = extract_placeholders(command_text);
    for name in &used {
        if !declared.contains(name) {
            out.push(Diagnostic::new(
                node.position,
                "command",
                format!(
                    "Variable '{}' used in command string but not defined in variables",
                    name
                ),
            ));
        }
    }
    for name in &declared {
        if !used.contains(name) {
            out.push(Diagnostic::new(
                node.position,
                "variables",
                format!("Variable '{}' defined but not used in command string", name),
            ));
        }
    }
}

/// Validate a variable list, returning the distinct declared names in order.
fn validate_variables(node: &Node, out: &mut Vec<Diagnostic>) -> Vec<String> {
    let Some(items) = node.as_sequence() else {
        out.push(Diagnostic::new(node.position, "variables", "variables must be a list"));
        return Vec::new();
    };

    let mut declared = Vec::new();
    let mut seen = HashSet::new();
    for item in items {
        let Some(name) = validate_variable(item, out) else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        if seen.insert(name.to_string()) {
            declared.push(name.to_string());
        } else {
            out.push(Diagnostic::new(
                item.position,
                "name",
                format!("Duplicate variable name '{}'", name),
            ));
        }
    }
    declared
}

/// Validate one variable mapping, returning its name ("" when absent).
fn validate_variable<'a>(node: &'a Node, out: &mut Vec<Diagnostic>) -> Option<&'a str> {
    let Some(entries) = node.as_mapping() else {
        out.push(Diagnostic::new(node.position, "", "Variable must be an object"));
        return None;
    };

    let mut name = "";
    let mut kind = "";
    for entry in entries {
        check_not_empty(entry, &VARIABLE_FIELDS, out);
        match entry.key.as_str() {
            "name" => name = entry.value.text(),
            "type" => kind = entry.value.text(),
            _ => {}
        }
    }
    report_missing(node, &VARIABLE_FIELDS, "Missing required field in variable", out);

    if !kind.is_empty() && kind.parse::<VariableType>().is_err() {
        out.push(Diagnostic::new(
            node.position,
            "type",
            format!("Invalid type '{}'", kind),
        ));
    }
    Some(name)
}

/// Only empty scalars are flagged; empty collections pass this check.
fn check_not_empty(entry: &Entry, required: &[&str], out: &mut Vec<Diagnostic>) {
    if required.contains(&entry.key.as_str()) && entry.value.is_empty_scalar() {
        out.push(Diagnostic::new(
            entry.key_position,
            entry.key.clone(),
            "Field cannot be empty",
        ));
    }
}

fn report_missing(node: &Node, required: &[&str], message: &str, out: &mut Vec<Diagnostic>) {
    for field in required {
        if node.get(field).is_none() {
            out.push(Diagnostic::new(node.position, *field, message));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const HEADER: &str = "name: My Template
description: A description
version: 1.0
author: Me
template_spec_version: 1.0
";

    fn run(yaml: &str) -> Vec<Diagnostic> {
        validate(yaml.as_bytes()).expect("well-formed YAML")
    }

    fn messages(diagnostics: &[Diagnostic]) -> Vec<&str> {
        diagnostics.iter().map(|d| d.message.as_str()).collect()
    }

    fn located(diagnostics: &[Diagnostic]) -> Vec<(usize, &str, &str)> {
        diagnostics
            .iter()
            .map(|d| (d.line, d.field.as_str(), d.message.as_str()))
            .collect()
    }

    #[test]
    fn test_valid_document() {
        let yaml = format!(
            "{HEADER}commands:
  - name: cmd1
    description: desc1
    command: echo {{{{var1}}}}
    variables:
      - name: var1
        type: string
        label: Var 1
"
        );
        assert_eq!(run(&yaml), vec![]);
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(
            run(""),
            vec![Diagnostic {
                line: 0,
                column: 0,
                field: String::new(),
                message: "Empty document".to_string(),
            }]
        );
    }

    #[test]
    fn test_root_not_mapping() {
        let diagnostics = run("- item1");
        assert_eq!(messages(&diagnostics), vec!["Root must be a mapping (object)"]);
        assert_eq!(diagnostics[0].line, 1);
    }

    #[test]
    fn test_missing_fields_in_declared_order() {
        let diagnostics = run("commands:
  - name: cmd1
    description: desc1
    command: echo hello
");
        let fields: Vec<&str> = diagnostics.iter().map(|d| d.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["name", "description", "version", "author", "template_spec_version"]
        );
        assert!(diagnostics
            .iter()
            .all(|d| d.message == "Missing required field" && d.line == 1));
    }

    #[test]
    fn test_empty_fields_point_at_keys() {
        let diagnostics = run("name:
description: \"\"
version: 1.0
author: Me
template_spec_version: 1.0
commands: []
");
        assert_eq!(
            located(&diagnostics),
            vec![
                (1, "name", "Field cannot be empty"),
                (2, "description", "Field cannot be empty"),
                (6, "commands", "commands list cannot be empty"),
            ]
        );
    }

    #[test]
    fn test_commands_not_a_list() {
        let diagnostics = run(&format!("{HEADER}commands: \"not a list\"\n"));
        assert_eq!(messages(&diagnostics), vec!["commands must be a list"]);
        assert_eq!(diagnostics[0].field, "commands");
    }

    #[test]
    fn test_command_not_an_object() {
        let diagnostics = run(&format!("{HEADER}commands:\n  - \"not an object\"\n"));
        assert_eq!(messages(&diagnostics), vec!["Command must be an object"]);
        assert_eq!(diagnostics[0].line, 7);
    }

    #[test]
    fn test_missing_command_fields() {
        let diagnostics = run(&format!("{HEADER}commands:\n  - name: cmd1\n"));
        assert_eq!(
            located(&diagnostics),
            vec![
                (7, "description", "Missing required field in command"),
                (7, "command", "Missing required field in command"),
            ]
        );
    }

    #[test]
    fn test_empty_command_string_skips_cross_reference() {
        let diagnostics = run(&format!(
            "{HEADER}commands:
  - name: cmd1
    description: desc1
    command: \"\"
    variables:
      - name: orphan
        type: string
        label: Orphan
"
        ));
        assert_eq!(messages(&diagnostics), vec!["Field cannot be empty"]);
    }

    #[test]
    fn test_variables_not_a_list() {
        let diagnostics = run(&format!(
            "{HEADER}commands:
  - name: cmd1
    description: desc1
    command: echo hello
    variables: \"not a list\"
"
        ));
        assert_eq!(messages(&diagnostics), vec!["variables must be a list"]);
    }

    #[test]
    fn test_variable_not_an_object() {
        let diagnostics = run(&format!(
            "{HEADER}commands:
  - name: cmd1
    description: desc1
    command: echo hello
    variables:
      - \"not an object\"
"
        ));
        assert_eq!(messages(&diagnostics), vec!["Variable must be an object"]);
    }

    #[test]
    fn test_missing_variable_fields() {
        let diagnostics = run(&format!(
            "{HEADER}commands:
  - name: cmd1
    description: desc1
    command: echo {{{{var1}}}}
    variables:
      - name: var1
"
        ));
        let fields: Vec<(&str, &str)> = diagnostics
            .iter()
            .map(|d| (d.field.as_str(), d.message.as_str()))
            .collect();
        assert_eq!(
            fields,
            vec![
                ("type", "Missing required field in variable"),
                ("label", "Missing required field in variable"),
            ]
        );
    }

    #[test]
    fn test_invalid_type_attributed_to_variable() {
        let diagnostics = run(&format!(
            "{HEADER}commands:
  - name: cmd1
    description: desc1
    command: pay {{{{amount}}}}
    variables:
      - name: amount
        type: currency
        label: Amount
"
        ));
        assert_eq!(
            located(&diagnostics),
            vec![(11, "type", "Invalid type 'currency'")]
        );
    }

    #[test]
    fn test_duplicate_flags_second_occurrence_only() {
        let diagnostics = run(&format!(
            "{HEADER}commands:
  - name: cmd1
    description: desc1
    command: echo {{{{var1}}}}
    variables:
      - name: var1
        type: string
        label: Var 1
      - name: var1
        type: number
        label: Var 1 Duplicate
"
        ));
        assert_eq!(
            located(&diagnostics),
            vec![(14, "name", "Duplicate variable name 'var1'")]
        );
    }

    #[test]
    fn test_cross_reference_both_directions() {
        let diagnostics = run(&format!(
            "{HEADER}commands:
  - name: test
    description: test
    command: echo {{{{x}}}}
    variables:
      - name: y
        type: string
        label: Y
"
        ));
        assert_eq!(
            located(&diagnostics),
            vec![
                (
                    7,
                    "command",
                    "Variable 'x' used in command string but not defined in variables"
                ),
                (
                    7,
                    "variables",
                    "Variable 'y' defined but not used in command string"
                ),
            ]
        );
    }

    #[test]
    fn test_declaration_errors_do_not_block_usage_check() {
        let diagnostics = run(&format!(
            "{HEADER}commands:
  - name: cmd1
    description: desc1
    command: cp {{{{src}}}} {{{{dst}}}}
    variables:
      - name: src
        label: Source
      - name: src
        type: file_input
        label: Source again
"
        ));
        assert_eq!(
            messages(&diagnostics),
            vec![
                "Missing required field in variable",
                "Duplicate variable name 'src'",
                "Variable 'dst' used in command string but not defined in variables",
            ]
        );
    }

    #[test]
    fn test_no_variables_field() {
        let yaml = format!(
            "{HEADER}commands:
  - name: cmd1
    description: desc1
    command: echo hello
"
        );
        assert_eq!(run(&yaml), vec![]);
        assert_eq!(run(&format!("{yaml}    variables: []\n")), vec![]);
    }

    #[test]
    fn test_syntax_error_is_not_a_diagnostic() {
        assert!(validate(b"name: My Template\n  description: Indentation error\n").is_err());
    }

    const COMMANDS: &str = "commands:
  - name: cmd1
    description: desc1
    command: echo hello
";

    #[test]
    fn test_quoted_null_tokens_are_not_empty() {
        let yaml = format!(
            "name: \"null\"
description: '~'
version: 'NULL'
author: \"Null\"
template_spec_version: 1.0
{COMMANDS}"
        );
        assert_eq!(run(&yaml), vec![]);
    }

    #[test]
    fn test_plain_null_tokens_are_empty() {
        let yaml = format!(
            "name: null
description: ~
version: NULL
author: Me
template_spec_version: 1.0
{COMMANDS}"
        );
        assert_eq!(
            located(&run(&yaml)),
            vec![
                (1, "name", "Field cannot be empty"),
                (2, "description", "Field cannot be empty"),
                (3, "version", "Field cannot be empty"),
            ]
        );
    }

    #[test]
    fn test_number_like_fields_are_text() {
        let yaml = format!(
            "name: 0x10
description: A description
version: 1.10
author: 123456789012345678901234567890
template_spec_version: 1.0
{COMMANDS}"
        );
        assert_eq!(run(&yaml), vec![]);
    }

    #[test]
    fn test_anchor_is_a_located_syntax_error() {
        let err = validate(b"name: demo\ndescription: &d text\n").unwrap_err();
        assert_eq!(err.position.line, 2);
    }

    #[test]
    fn test_display_shape() {
        let d = Diagnostic::new(Position::new(3, 1), "name", "Field cannot be empty");
        assert_eq!(d.to_string(), "Line 3: name - Field cannot be empty");
    }

    #[test]
    fn test_json_shape() {
        let d = Diagnostic::new(Position::new(3, 1), "name", "Field cannot be empty");
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "line": 3,
                "column": 1,
                "field": "name",
                "message": "Field cannot be empty",
            })
        );
    }
}
