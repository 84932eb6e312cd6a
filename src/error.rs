//! Error types for decoding and encoding templates

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::parser::tree::Position;

/// Raised when a buffer is not well-formed template text.
///
/// A syntax error never carries semantic information; missing or empty
/// fields are reported as [`crate::Diagnostic`]s instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("YAML syntax error: {message}")]
pub struct SyntaxError {
    pub message: String,
    /// Location of the failure, `Position::UNKNOWN` when the parser gave none
    pub position: Position,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, position: Position) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        if self.position.is_unknown() {
            return format!("Error: {}\n", self);
        }
        render_report(source, filename, self.position, &self.message, &self.message)
    }
}

impl From<serde_yaml::Error> for SyntaxError {
    fn from(err: serde_yaml::Error) -> Self {
        let position = err
            .location()
            .map(|loc| Position::new(loc.line(), loc.column()))
            .unwrap_or(Position::UNKNOWN);
        SyntaxError::new(err.to_string(), position)
    }
}

impl From<marked_yaml::LoadError> for SyntaxError {
    fn from(err: marked_yaml::LoadError) -> Self {
        use marked_yaml::LoadError;

        let marker = match &err {
            LoadError::TopLevelMustBeMapping(marker)
            | LoadError::UnexpectedAnchor(marker)
            | LoadError::MappingKeyMustBeScalar(marker)
            | LoadError::UnexpectedTag(marker)
            | LoadError::ScanError(marker, _) => Some(marker),
            _ => None,
        };
        let position = marker
            .map(|marker| Position::new(marker.line(), marker.column()))
            .unwrap_or(Position::UNKNOWN);
        SyntaxError::new(err.to_string(), position)
    }
}

impl From<std::str::Utf8Error> for SyntaxError {
    fn from(err: std::str::Utf8Error) -> Self {
        SyntaxError::new(format!("input is not valid UTF-8: {}", err), Position::UNKNOWN)
    }
}

/// Errors produced while serializing a [`crate::Document`]
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("failed to marshal template: {0}")]
    Serialize(#[from] serde_yaml::Error),

    /// The document serialized to nothing or to a bare `{}`
    #[error("generated YAML is empty or invalid")]
    Empty,
}

/// Render a single-label ariadne report pointing at `position`.
pub(crate) fn render_report(
    source: &str,
    filename: &str,
    position: Position,
    message: &str,
    label: &str,
) -> String {
    let offset = char_offset(source, position);
    let end = (offset + 1).min(source.chars().count()).max(offset);

    let mut buf = Vec::new();
    let written = Report::build(ReportKind::Error, filename, offset)
        .with_message(message)
        .with_label(
            Label::new((filename, offset..end))
                .with_message(label)
                .with_color(Color::Red),
        )
        .finish()
        .write((filename, Source::from(source)), &mut buf);

    match written {
        Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
        Err(_) => format!("Error: line {}: {}\n", position.line, message),
    }
}

/// Character offset of a 1-based line/column position, clamped to the source.
pub(crate) fn char_offset(source: &str, position: Position) -> usize {
    if position.is_unknown() {
        return 0;
    }
    let mut offset = 0;
    for (idx, line) in source.split_inclusive('\n').enumerate() {
        if idx + 1 == position.line {
            let width = line.trim_end_matches('\n').chars().count();
            return offset + position.column.saturating_sub(1).min(width);
        }
        offset += line.chars().count();
    }
    offset
}
