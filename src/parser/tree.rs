//! Position-aware generic YAML tree
//!
//! The validator walks this tree instead of the typed [`super::Document`] so
//! that every diagnostic can point at an exact line and column. Scalars are
//! kept as raw source text; nothing is coerced.

use std::collections::HashSet;
use std::fmt;

use marked_yaml::Node as MarkedNode;
use serde::de::{
    self, Deserialize, Deserializer, EnumAccess, MapAccess, SeqAccess, VariantAccess, Visitor,
};

use crate::error::SyntaxError;

/// 1-based source location. `line == 0` means the location is unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub const UNKNOWN: Position = Position { line: 0, column: 0 };

    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    pub fn is_unknown(&self) -> bool {
        self.line == 0
    }

    fn from_span(span: &marked_yaml::Span) -> Self {
        span.start()
            .map(|marker| Position::new(marker.line(), marker.column()))
            .unwrap_or(Position::UNKNOWN)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Shape of a node, independent of its content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Scalar,
    Sequence,
    Mapping,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Scalar => write!(f, "scalar"),
            NodeKind::Sequence => write!(f, "sequence"),
            NodeKind::Mapping => write!(f, "mapping"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub position: Position,
    pub value: NodeValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    /// Raw scalar text; plain nulls (`~`, `null`, empty) are stored as ""
    Scalar { text: String, style: ScalarStyle },
    Sequence(Vec<Node>),
    Mapping(Vec<Entry>),
}

/// How a scalar was written in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarStyle {
    /// Unquoted; the only style that can stand for null, a boolean or a number
    Plain,
    /// Single- or double-quoted
    Quoted,
    /// Literal (`|`) or folded (`>`) block
    Block,
}

/// One key/value pair of a mapping, in source order
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub key: String,
    pub key_position: Position,
    pub value: Node,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match &self.value {
            NodeValue::Scalar { .. } => NodeKind::Scalar,
            NodeValue::Sequence(_) => NodeKind::Sequence,
            NodeValue::Mapping(_) => NodeKind::Mapping,
        }
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match &self.value {
            NodeValue::Scalar { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Scalar text, only when it was written without quotes
    pub fn as_plain_scalar(&self) -> Option<&str> {
        match &self.value {
            NodeValue::Scalar {
                text,
                style: ScalarStyle::Plain,
            } => Some(text),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Node]> {
        match &self.value {
            NodeValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&[Entry]> {
        match &self.value {
            NodeValue::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// Scalar text, or "" for collections
    pub fn text(&self) -> &str {
        self.as_scalar().unwrap_or("")
    }

    /// True only for scalars with no content. Empty collections are not empty scalars.
    pub fn is_empty_scalar(&self) -> bool {
        matches!(&self.value, NodeValue::Scalar { text, .. } if text.is_empty())
    }

    /// Look up a mapping entry by key
    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.as_mapping()?.iter().find(|entry| entry.key == key)
    }
}

/// Result of reading a buffer into a generic tree
#[derive(Debug, Clone, PartialEq)]
pub enum Tree {
    /// No content at all: blank, comments, or bare document markers
    Empty,
    /// The root node is a scalar or sequence; only its kind and position are kept
    NotMapping { kind: NodeKind, position: Position },
    /// A mapping root with positions on every node
    Mapping(Node),
}

/// Parse text into a positioned tree.
///
/// Fails when the text is not well-formed YAML, and when it uses anchors,
/// aliases or explicit tags, which the positioned loader does not accept.
pub fn parse_tree(text: &str) -> Result<Tree, SyntaxError> {
    let Some(root_position) = first_content_position(text) else {
        return Ok(Tree::Empty);
    };

    // serde_yaml gives located syntax errors and rejects duplicate keys; the
    // marked loader only accepts mapping roots, so the kind is checked first.
    let Shape(kind) = serde_yaml::from_str::<Shape>(text)?;
    if kind != NodeKind::Mapping {
        return Ok(Tree::NotMapping {
            kind,
            position: root_position,
        });
    }

    let marked = marked_yaml::parse_yaml(0, text)?;
    let lines: Vec<&str> = text.lines().collect();
    Ok(Tree::Mapping(convert(&marked, &lines)))
}

fn convert(node: &MarkedNode, lines: &[&str]) -> Node {
    let position = Position::from_span(node.span());
    let value = match node {
        MarkedNode::Scalar(scalar) => {
            let raw = scalar.as_str();
            let style = scalar_style(lines, position, raw);
            let text = if style == ScalarStyle::Plain && is_null_token(raw) {
                String::new()
            } else {
                raw.to_string()
            };
            NodeValue::Scalar { text, style }
        }
        MarkedNode::Sequence(items) => NodeValue::Sequence(
            items.iter().map(|item| convert(item, lines)).collect(),
        ),
        MarkedNode::Mapping(entries) => NodeValue::Mapping(
            entries
                .iter()
                .map(|(key, value)| Entry {
                    key: key.as_str().to_string(),
                    key_position: Position::from_span(key.span()),
                    value: convert(value, lines),
                })
                .collect(),
        ),
    };
    Node { position, value }
}

/// Style of a scalar, read from its first character in the source.
fn scalar_style(lines: &[&str], position: Position, raw: &str) -> ScalarStyle {
    let Some(rest) = source_from(lines, position) else {
        return ScalarStyle::Plain;
    };
    match rest.chars().next() {
        Some(quote @ ('"' | '\'')) => {
            // An empty value is placed at the token that follows it, which can
            // be a quoted key. A quoted null token is spelled out in full.
            if is_null_token(raw) && !rest.starts_with(&format!("{quote}{raw}{quote}")) {
                ScalarStyle::Plain
            } else {
                ScalarStyle::Quoted
            }
        }
        Some('|' | '>') => ScalarStyle::Block,
        _ => ScalarStyle::Plain,
    }
}

fn source_from<'a>(lines: &[&'a str], position: Position) -> Option<&'a str> {
    let line = *lines.get(position.line.checked_sub(1)?)?;
    let column = position.column.checked_sub(1)?;
    let (start, _) = line.char_indices().nth(column)?;
    Some(&line[start..])
}

fn is_null_token(raw: &str) -> bool {
    matches!(raw, "" | "~" | "null" | "Null" | "NULL")
}

/// Kind of a parsed node. Deserializing it walks the whole document without
/// turning any scalar into a number, so out-of-range integers are accepted.
struct Shape(NodeKind);

impl<'de> Deserialize<'de> for Shape {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ShapeVisitor)
    }
}

struct ShapeVisitor;

impl ShapeVisitor {
    fn scalar<E>(self) -> Result<Shape, E> {
        Ok(Shape(NodeKind::Scalar))
    }
}

impl<'de> Visitor<'de> for ShapeVisitor {
    type Value = Shape;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any YAML node")
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<Shape, E> {
        self.scalar()
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<Shape, E> {
        self.scalar()
    }

    fn visit_i128<E: de::Error>(self, _: i128) -> Result<Shape, E> {
        self.scalar()
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<Shape, E> {
        self.scalar()
    }

    fn visit_u128<E: de::Error>(self, _: u128) -> Result<Shape, E> {
        self.scalar()
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<Shape, E> {
        self.scalar()
    }

    fn visit_str<E: de::Error>(self, _: &str) -> Result<Shape, E> {
        self.scalar()
    }

    fn visit_unit<E: de::Error>(self) -> Result<Shape, E> {
        self.scalar()
    }

    fn visit_none<E: de::Error>(self) -> Result<Shape, E> {
        self.scalar()
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Shape, D::Error> {
        Shape::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Shape, A::Error> {
        while seq.next_element::<Shape>()?.is_some() {}
        Ok(Shape(NodeKind::Sequence))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Shape, A::Error> {
        let mut seen = HashSet::new();
        while let Some(KeyText(key)) = map.next_key()? {
            if !seen.insert(key.clone()) {
                return Err(de::Error::custom(format!("duplicate entry with key {:?}", key)));
            }
            map.next_value::<Shape>()?;
        }
        Ok(Shape(NodeKind::Mapping))
    }

    fn visit_enum<A: EnumAccess<'de>>(self, data: A) -> Result<Shape, A::Error> {
        // tagged node: the tag is the variant, the node itself the content
        let (_, variant) = data.variant::<de::IgnoredAny>()?;
        variant.newtype_variant::<Shape>()
    }
}

/// Scalar mapping key in a comparable textual form
struct KeyText(String);

impl<'de> Deserialize<'de> for KeyText {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(KeyTextVisitor)
    }
}

struct KeyTextVisitor;

impl<'de> Visitor<'de> for KeyTextVisitor {
    type Value = KeyText;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a scalar mapping key")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<KeyText, E> {
        Ok(KeyText(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<KeyText, E> {
        Ok(KeyText(v.to_string()))
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<KeyText, E> {
        Ok(KeyText(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<KeyText, E> {
        Ok(KeyText(v.to_string()))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<KeyText, E> {
        Ok(KeyText(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<KeyText, E> {
        Ok(KeyText(v.to_string()))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<KeyText, E> {
        Ok(KeyText(v.to_string()))
    }

    fn visit_unit<E: de::Error>(self) -> Result<KeyText, E> {
        Ok(KeyText("~".to_string()))
    }
}

/// Position of the first line carrying YAML content, or `None` for a blank document.
pub(crate) fn first_content_position(text: &str) -> Option<Position> {
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty()
            || trimmed.starts_with('#')
            || trimmed.starts_with('%')
            || trimmed == "..."
        {
            continue;
        }
        let indent = line.len() - line.trim_start().len();
        if let Some(after) = trimmed.strip_prefix("---") {
            let rest = after.trim_start();
            if rest.is_empty() || rest.starts_with('#') {
                continue;
            }
            let column = indent + 3 + (after.len() - rest.len()) + 1;
            return Some(Position::new(idx + 1, column));
        }
        return Some(Position::new(idx + 1, indent + 1));
    }
    None
}
