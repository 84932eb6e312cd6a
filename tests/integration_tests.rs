//! Integration tests for decoding, validating and encoding templates

use cliqfile::{decode, encode, load, validate, Diagnostic, LoadError, VariableType};
use pretty_assertions::assert_eq;

const VALID: &str = include_str!("fixtures/valid.yaml");
const BROKEN: &str = include_str!("fixtures/broken.yaml");

fn located(diagnostics: &[Diagnostic]) -> Vec<(usize, &str, &str)> {
    diagnostics
        .iter()
        .map(|d| (d.line, d.field.as_str(), d.message.as_str()))
        .collect()
}

#[test]
fn test_valid_fixture_reports_only_unused_variable() {
    let diagnostics = validate(VALID.as_bytes()).expect("Should parse");
    assert!(
        diagnostics.iter().any(|d| d.message.contains("'format' defined but not used")),
        "Expected the unused select variable to be reported, got: {:?}",
        diagnostics
    );
    assert_eq!(diagnostics.len(), 1);
}

#[test]
fn test_decode_valid_fixture() {
    let doc = decode(VALID.as_bytes()).expect("Should decode");
    assert_eq!(doc.name, "Image Tools");
    assert_eq!(doc.version, "1.2");
    assert_eq!(doc.commands.len(), 2);

    let resize = &doc.commands[0];
    assert_eq!(resize.id, "resize");
    assert_eq!(
        resize.variable("width").and_then(|v| v.variable_type()),
        Some(VariableType::Number)
    );
    assert!(resize.variable("input_file").unwrap().required);
    assert_eq!(doc.commands[1].id, "");
}

#[test]
fn test_broken_fixture_reports_everything_in_one_pass() {
    let diagnostics = validate(BROKEN.as_bytes()).expect("Should parse");
    assert_eq!(
        located(&diagnostics),
        vec![
            (2, "description", "Field cannot be empty"),
            (10, "type", "Invalid type 'toggle'"),
            (13, "name", "Duplicate variable name 'flag'"),
            (
                6,
                "command",
                "Variable 'target' used in command string but not defined in variables"
            ),
            (6, "variables", "Variable 'extra' defined but not used in command string"),
            (19, "", "Command must be an object"),
            (20, "description", "Missing required field in command"),
            (20, "command", "Missing required field in command"),
            (21, "variables", "variables must be a list"),
            (1, "author", "Missing required field"),
        ]
    );
}

#[test]
fn test_decode_rejects_wrong_kinds_but_not_missing_fields() {
    let doc = decode(BROKEN.as_bytes());
    assert!(doc.is_err(), "a scalar where a list belongs cannot be decoded");

    let lenient = decode(b"name: x\ncommands:\n  - command: echo {{a}}\n").expect("Should decode");
    assert_eq!(lenient.commands[0].command, "echo {{a}}");
    assert!(lenient.commands[0].variables.is_empty());
}

#[test]
fn test_decode_encode_round_trip_for_clean_document() {
    let source = VALID.replace(
        "      - name: format\n        type: select\n        label: Format\n        options:\n          choices: [json, text]\n",
        "",
    );
    let doc = load(source.as_bytes()).expect("Should load");
    let text = encode(&doc).expect("Should encode");
    assert_eq!(decode(text.as_bytes()).expect("Should decode"), doc);
    assert_eq!(validate(text.as_bytes()).expect("Should parse"), vec![]);
}

#[test]
fn test_load_surfaces_diagnostics() {
    match load(BROKEN.as_bytes()) {
        Err(LoadError::Invalid(diagnostics)) => assert_eq!(diagnostics.len(), 10),
        other => panic!("expected validation failure, got {:?}", other),
    }
}

#[test]
fn test_empty_buffer() {
    let diagnostics = validate(b"").expect("Should not be a syntax error");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].message, "Empty document");
    assert_eq!(diagnostics[0].line, 0);
    assert_eq!(diagnostics[0].field, "");
}

#[test]
fn test_minimal_document_without_variables() {
    let source = r#"
name: Hello
description: Print hello
version: "1"
author: Me
template_spec_version: "1"
commands:
  - name: hello
    description: hello
    command: echo hello
"#;
    assert_eq!(validate(source.as_bytes()).expect("Should parse"), vec![]);
}

#[test]
fn test_syntax_error_is_separate_from_diagnostics() {
    let err = validate(b"name: [unterminated\n").expect_err("Should fail to parse");
    assert!(err.to_string().starts_with("YAML syntax error"));
    assert!(decode(b"name: [unterminated\n").is_err());
}
